use crate::error::ScanError;

/// Time-domain record on an evenly spaced grid. Precondition for the
/// spectral transform; each resampling produces a fresh instance.
#[derive(Clone, Debug)]
pub struct UniformWaveform {
    pub t0: f64,
    pub dt: f64,
    pub values: Vec<f64>,
}

impl UniformWaveform {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn time(&self, i: usize) -> f64 {
        self.t0 + i as f64 * self.dt
    }

    pub fn times(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.time(i)).collect()
    }
}

/// How an irregular series is put onto a uniform grid.
#[derive(Clone, Copy, Debug)]
pub struct ResampleConfig {
    /// Target sampling interval (ps).
    pub dt: f64,
    /// Drop input samples past this time before gridding.
    pub cut_max: Option<f64>,
    /// Truncate the grid to exactly `2^pow2` points from the first input
    /// time; points past the last input sample are filled with 0.
    pub pow2: Option<u32>,
}

impl ResampleConfig {
    pub fn new(dt: f64) -> Self {
        Self {
            dt,
            cut_max: None,
            pow2: None,
        }
    }
}

/// Linear interpolation of `(times, values)` onto a uniform grid spanning
/// `[t_min, t_max)` stepped by `cfg.dt`. Times must be ascending. Grid
/// points past the last input time take the right-boundary fill value 0.
pub fn resample(
    times: &[f64],
    values: &[f64],
    cfg: &ResampleConfig,
) -> Result<UniformWaveform, ScanError> {
    debug_assert_eq!(times.len(), values.len());

    if !cfg.dt.is_finite() || cfg.dt <= 0.0 {
        return Err(ScanError::InvalidInterval(cfg.dt));
    }
    if let Some(p) = cfg.pow2 {
        // 1 << p must stay a representable grid length
        if p >= usize::BITS {
            return Err(ScanError::GridTooLarge(p));
        }
    }

    let (times, values): (Vec<f64>, Vec<f64>) = match cfg.cut_max {
        Some(max) => times
            .iter()
            .zip(values)
            .filter(|(&t, _)| t <= max)
            .map(|(&t, &v)| (t, v))
            .unzip(),
        None => (times.to_vec(), values.to_vec()),
    };
    if times.len() < 2 {
        return Err(ScanError::InsufficientData(times.len()));
    }

    let t_min = times[0];
    let n = match cfg.pow2 {
        Some(p) => 1usize << p,
        None => {
            let t_max = times[times.len() - 1];
            ((t_max - t_min) / cfg.dt).ceil() as usize
        }
    };

    let values = (0..n)
        .map(|i| interp(t_min + i as f64 * cfg.dt, &times, &values))
        .collect();
    Ok(UniformWaveform {
        t0: t_min,
        dt: cfg.dt,
        values,
    })
}

/// Piecewise-linear lookup with flat left boundary and a fixed 0 fill to
/// the right of the last sample.
fn interp(t: f64, times: &[f64], values: &[f64]) -> f64 {
    let last = times.len() - 1;
    if t > times[last] {
        return 0.0;
    }
    if t <= times[0] {
        return values[0];
    }
    let j = times.partition_point(|&x| x <= t) - 1;
    if j >= last {
        return values[last];
    }
    let frac = (t - times[j]) / (times[j + 1] - times[j]);
    values[j] + frac * (values[j + 1] - values[j])
}

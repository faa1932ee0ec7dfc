use rustfft::{num_complex::Complex64, FftPlanner};

use crate::analysis::resample::UniformWaveform;
use crate::error::ScanError;

/// Single-sided spectrum of a uniform waveform: the first ⌊N/2⌋ DFT bins,
/// index-aligned, ascending from 0 frequency.
#[derive(Clone, Debug)]
pub struct Spectrum {
    pub freq: Vec<f64>,
    pub ampl: Vec<f64>,
    pub phase: Vec<f64>,
    pub coeff: Vec<Complex64>,
}

impl Spectrum {
    /// Forward DFT of the waveform, truncated below the Nyquist index.
    ///
    /// Each retained coefficient is conjugated before amplitude/phase
    /// extraction. The conjugation is a sign convention the downstream
    /// phase analysis depends on; a delayed cosine comes out with positive
    /// phase.
    pub fn single_sided(wave: &UniformWaveform) -> Result<Self, ScanError> {
        let n = wave.len();
        if n < 2 {
            return Err(ScanError::InsufficientData(n));
        }

        let mut buf: Vec<Complex64> = wave
            .values
            .iter()
            .map(|&v| Complex64::new(v, 0.0))
            .collect();
        let mut planner = FftPlanner::<f64>::new();
        planner.plan_fft_forward(n).process(&mut buf);

        let half = n / 2;
        let scale = 2.0 / n as f64;
        let df = 1.0 / (n as f64 * wave.dt);
        let mut freq = Vec::with_capacity(half);
        let mut ampl = Vec::with_capacity(half);
        let mut phase = Vec::with_capacity(half);
        let mut coeff = Vec::with_capacity(half);
        for (k, c) in buf.into_iter().take(half).enumerate() {
            let c = c.conj();
            freq.push(k as f64 * df);
            ampl.push(scale * c.norm());
            phase.push(c.arg());
            coeff.push(c);
        }
        Ok(Spectrum {
            freq,
            ampl,
            phase,
            coeff,
        })
    }

    pub fn len(&self) -> usize {
        self.freq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freq.is_empty()
    }

    /// Index of the strongest non-DC bin.
    pub fn peak_bin(&self) -> Option<usize> {
        self.ampl
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn cosine(n: usize, dt: f64, ampl: f64, f: f64, delay: f64) -> UniformWaveform {
        let values = (0..n)
            .map(|i| ampl * (2.0 * PI * f * (i as f64 * dt - delay)).cos())
            .collect();
        UniformWaveform {
            t0: 0.0,
            dt,
            values,
        }
    }

    #[test]
    fn recovers_cosine_amplitude_at_nearest_bin() {
        let n = 64;
        let dt = 0.25;
        let df = 1.0 / (n as f64 * dt);
        let f = 4.0 * df; // integer number of cycles, no leakage
        let spec = Spectrum::single_sided(&cosine(n, dt, 3.0, f, 0.0)).unwrap();
        assert_eq!(spec.len(), 32);
        assert!((spec.ampl[4] - 3.0).abs() < 1e-9);
        for (k, a) in spec.ampl.iter().enumerate() {
            if k != 4 {
                assert!(a.abs() < 1e-9, "bin {k} leaked {a}");
            }
        }
        assert_eq!(spec.peak_bin(), Some(4));
    }

    #[test]
    fn delayed_cosine_has_positive_phase() {
        let n = 64;
        let dt = 0.25;
        let df = 1.0 / (n as f64 * dt);
        let f = 4.0 * df;
        let delay = 1.0; // f * delay = 1/4 cycle
        let spec = Spectrum::single_sided(&cosine(n, dt, 1.0, f, delay)).unwrap();
        let expected = 2.0 * PI * f * delay; // +pi/2 under the conjugated convention
        assert!((spec.phase[4] - expected).abs() < 1e-9);
    }

    #[test]
    fn frequency_axis_matches_dft_bins() {
        let wave = UniformWaveform {
            t0: 0.0,
            dt: 0.5,
            values: vec![0.0; 8],
        };
        let spec = Spectrum::single_sided(&wave).unwrap();
        assert_eq!(spec.freq, vec![0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn odd_length_input_is_plain_dft() {
        let wave = UniformWaveform {
            t0: 0.0,
            dt: 1.0,
            values: (0..33).map(|i| (i as f64 * 0.2).sin()).collect(),
        };
        let spec = Spectrum::single_sided(&wave).unwrap();
        assert_eq!(spec.len(), 16);
    }

    #[test]
    fn deterministic_output() {
        let wave = UniformWaveform {
            t0: 0.0,
            dt: 0.1,
            values: (0..50).map(|i| (i as f64).cos()).collect(),
        };
        let a = Spectrum::single_sided(&wave).unwrap();
        let b = Spectrum::single_sided(&wave).unwrap();
        assert_eq!(a.ampl, b.ampl);
        assert_eq!(a.phase, b.phase);
    }

    #[test]
    fn rejects_degenerate_input() {
        let wave = UniformWaveform {
            t0: 0.0,
            dt: 1.0,
            values: vec![1.0],
        };
        assert!(matches!(
            Spectrum::single_sided(&wave),
            Err(ScanError::InsufficientData(1))
        ));
    }
}

pub mod plot;
pub mod resample;
pub mod spectrum;
pub mod units;

pub use plot::{render_trace_png, TraceStyle};
pub use resample::{resample, ResampleConfig, UniformWaveform};
pub use spectrum::Spectrum;

use std::fs::{self, File};
use std::path::Path;

use crate::error::ScanError;
use crate::scan::record::ScanRecord;

/// Offline pipeline over a recorded scan: raw table, uniform time-domain
/// waveform (X rescaled from A to nA), and its single-sided spectrum.
pub struct ScanDataset {
    pub raw: ScanRecord,
    pub time_dom: UniformWaveform,
    pub freq_dom: Spectrum,
}

impl ScanDataset {
    pub fn load(path: impl AsRef<Path>, cfg: &ResampleConfig) -> Result<Self, ScanError> {
        Self::from_record(ScanRecord::from_file(path)?, cfg)
    }

    pub fn from_record(raw: ScanRecord, cfg: &ResampleConfig) -> Result<Self, ScanError> {
        // drop rows an aborted or padded scan left unusable
        let (times, values): (Vec<f64>, Vec<f64>) = raw
            .t_ps
            .iter()
            .zip(&raw.x)
            .filter(|(t, v)| t.is_finite() && v.is_finite())
            .map(|(&t, &v)| (t, units::amps_to_nanoamps(v)))
            .unzip();
        let time_dom = resample(&times, &values, cfg)?;
        let freq_dom = Spectrum::single_sided(&time_dom)?;
        Ok(Self {
            raw,
            time_dom,
            freq_dom,
        })
    }

    /// Write waveform and spectrum tables plus their plots under `out`.
    pub fn save(&self, out: impl AsRef<Path>, stem: &str) -> Result<(), ScanError> {
        let out = out.as_ref();
        fs::create_dir_all(out)?;

        let mut w = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(File::create(out.join(format!("{stem}_waveform.dat")))?);
        w.write_record(["t", "E"])?;
        for (i, v) in self.time_dom.values.iter().enumerate() {
            w.write_record([self.time_dom.time(i).to_string(), v.to_string()])?;
        }
        w.flush()?;

        let mut w = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(File::create(out.join(format!("{stem}_spectrum.dat")))?);
        w.write_record(["freq", "ampl", "phase"])?;
        for i in 0..self.freq_dom.len() {
            w.write_record([
                self.freq_dom.freq[i].to_string(),
                self.freq_dom.ampl[i].to_string(),
                self.freq_dom.phase[i].to_string(),
            ])?;
        }
        w.flush()?;

        let wave_style = TraceStyle {
            caption: "Time-domain waveform".into(),
            x_desc: "t (ps)".into(),
            y_desc: "E (nA)".into(),
            ..Default::default()
        };
        let png = render_trace_png(&self.time_dom.times(), &self.time_dom.values, &wave_style)?;
        fs::write(out.join(format!("{stem}_waveform.png")), png)?;

        let spec_style = TraceStyle {
            caption: "Amplitude spectrum".into(),
            x_desc: "freq (THz)".into(),
            y_desc: "ampl (nA)".into(),
            ..Default::default()
        };
        let png = render_trace_png(&self.freq_dom.freq, &self.freq_dom.ampl, &spec_style)?;
        fs::write(out.join(format!("{stem}_spectrum.png")), png)?;

        log::info!("saved analysis of {stem} to {}", out.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn cosine_record(n: usize, dt: f64, f: f64) -> ScanRecord {
        let t_ps: Vec<f64> = (0..n).map(|i| i as f64 * dt).collect();
        // recorded in amps; the pipeline rescales to nA
        let x: Vec<f64> = t_ps
            .iter()
            .map(|&t| 2.0e-9 * (2.0 * PI * f * t).cos())
            .collect();
        let len = t_ps.len();
        ScanRecord {
            t_ps,
            x,
            y: vec![0.0; len],
            aux: vec![100.0; len],
            position_mm: vec![0.0; len],
            position_error_mm: vec![f64::NAN; len],
        }
    }

    #[test]
    fn pipeline_recovers_cosine_peak_in_nanoamps() {
        let n = 65; // grid keeps 64 points under the exclusive end
        let dt = 0.25;
        let f = 4.0 / (64.0 * dt);
        let dataset =
            ScanDataset::from_record(cosine_record(n, dt, f), &ResampleConfig::new(dt)).unwrap();
        assert_eq!(dataset.time_dom.len(), 64);
        let peak = dataset.freq_dom.peak_bin().unwrap();
        assert_eq!(peak, 4);
        assert!((dataset.freq_dom.ampl[peak] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn nonfinite_rows_are_dropped_before_gridding() {
        let mut record = cosine_record(17, 1.0, 0.1);
        record.x[16] = f64::NAN;
        let dataset =
            ScanDataset::from_record(record, &ResampleConfig::new(1.0)).unwrap();
        // last finite sample is at t = 15
        assert_eq!(dataset.time_dom.len(), 15);
        assert!(dataset.time_dom.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn save_writes_tables_and_plots() {
        let dir = tempfile::tempdir().unwrap();
        let dataset =
            ScanDataset::from_record(cosine_record(33, 0.5, 0.25), &ResampleConfig::new(0.5))
                .unwrap();
        dataset.save(dir.path(), "test").unwrap();
        for name in [
            "test_waveform.dat",
            "test_spectrum.dat",
            "test_waveform.png",
            "test_spectrum.png",
        ] {
            assert!(dir.path().join(name).is_file(), "{name} missing");
        }
    }
}

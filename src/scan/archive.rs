use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::analysis::plot::{render_trace_png, TraceStyle};
use crate::config::Preset;
use crate::error::ScanError;
use crate::scan::record::ScanRecord;

/// Output-folder persistence for completed scans: data table, parameter
/// info file and plot snapshot, under a shared timestamped stem.
pub struct Archive {
    data_dir: PathBuf,
    info_dir: PathBuf,
    plot_dir: PathBuf,
}

impl Archive {
    pub fn create(root: impl AsRef<Path>) -> Result<Self, ScanError> {
        let root = root.as_ref();
        let archive = Self {
            data_dir: root.join("data"),
            info_dir: root.join("info"),
            plot_dir: root.join("plot"),
        };
        for dir in [&archive.data_dir, &archive.info_dir, &archive.plot_dir] {
            fs::create_dir_all(dir)?;
        }
        log::debug!("checked output folders under {}", root.display());
        Ok(archive)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Persist one completed scan. Returns the filename stem shared by the
    /// three written files.
    pub fn save(&self, record: &ScanRecord, preset: &Preset) -> Result<String, ScanError> {
        let stem = scan_stem(Local::now().naive_local(), preset);

        record.write_tsv(File::create(self.data_dir.join(format!("{stem}.dat")))?)?;
        preset.save(self.info_dir.join(format!("{stem}.json")))?;

        let ymax = preset.scan.ymax_na * 1e-9; // nA to A
        let style = TraceStyle {
            caption: "Delay scan".into(),
            x_desc: "position (mm)".into(),
            y_desc: "X (A)".into(),
            y_bounds: Some((-ymax, ymax)),
            ..Default::default()
        };
        let png = render_trace_png(&record.position_mm, &record.x, &style)?;
        fs::write(self.plot_dir.join(format!("{stem}.png")), png)?;

        log::info!("saved scan as {stem}");
        Ok(stem)
    }
}

/// Timestamp and scan parameters encoded into the archived filename stem.
fn scan_stem(at: NaiveDateTime, preset: &Preset) -> String {
    format!(
        "{}_{}to{}mm_{}_{}_{}_{}",
        at.format("%Y%m%d-%H%M%S"),
        preset.scan.start_mm,
        preset.scan.end_mm,
        preset.scan.mode_tag(),
        preset.labels.setup,
        preset.labels.sample,
        preset.labels.notes,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LockinSettings, ScanConfig, ScanLabels, ScanMode};
    use crate::scan::buffer::{RawSample, ScanBuffer};
    use crate::scan::record::assemble;
    use chrono::NaiveDate;

    fn preset() -> Preset {
        Preset {
            scan: ScanConfig {
                start_mm: 10.0,
                end_mm: 0.0,
                velocity_mm_per_s: 0.5,
                mode: ScanMode::Fast,
                ymax_na: 5.0,
            },
            labels: ScanLabels {
                setup: "tx1".into(),
                sample: "GaAs".into(),
                notes: "dark".into(),
            },
            lockin: LockinSettings {
                sensitivity_na: 100.0,
                time_constant_s: 0.1,
                chop_freq_hz: 1_370.0,
            },
        }
    }

    fn record() -> crate::scan::record::ScanRecord {
        let mut buf = ScanBuffer::with_capacity(3);
        for (i, p) in [10.0, 9.5, 9.0].into_iter().enumerate() {
            buf.write(
                i,
                RawSample {
                    position_mm: p,
                    primary: 1e-9,
                    quadrature: 0.0,
                    aux: 100.0,
                },
            );
        }
        assemble(&buf, None)
    }

    #[test]
    fn stem_encodes_timestamp_and_parameters() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(14, 30, 5)
            .unwrap();
        let stem = scan_stem(at, &preset());
        assert_eq!(stem, "20240315-143005_10to0mm_fastscan_tx1_GaAs_dark");
    }

    #[test]
    fn save_writes_data_info_and_plot() {
        let dir = tempfile::tempdir().unwrap();
        let archive = Archive::create(dir.path()).unwrap();
        let stem = archive.save(&record(), &preset()).unwrap();
        assert!(dir.path().join("data").join(format!("{stem}.dat")).is_file());
        assert!(dir.path().join("info").join(format!("{stem}.json")).is_file());
        assert!(dir.path().join("plot").join(format!("{stem}.png")).is_file());
    }
}

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Acquisition mode of a delay-line scan.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum ScanMode {
    /// Stage moves continuously; samples are taken on a fixed software timer.
    Fast,
    /// Stage is commanded to discrete positions with a settle wait before
    /// each sample. The wait is a multiple of the lock-in time constant.
    Stepped {
        step_mm: f64,
        wait_time_constants: f64,
    },
}

/// User-facing scan parameters. Scans always move toward decreasing
/// position, so `start_mm > end_mm`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ScanConfig {
    pub start_mm: f64,
    pub end_mm: f64,
    pub velocity_mm_per_s: f64,
    #[serde(flatten)]
    pub mode: ScanMode,
    /// Live-plot y bound, nA.
    pub ymax_na: f64,
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ScanError> {
        if !(self.start_mm.is_finite() && self.end_mm.is_finite()) || self.start_mm <= self.end_mm
        {
            return Err(ScanError::InvalidBounds {
                start: self.start_mm,
                end: self.end_mm,
            });
        }
        if !self.velocity_mm_per_s.is_finite() || self.velocity_mm_per_s <= 0.0 {
            return Err(ScanError::InvalidVelocity(self.velocity_mm_per_s));
        }
        if let ScanMode::Stepped {
            step_mm,
            wait_time_constants,
        } = self.mode
        {
            if !step_mm.is_finite() || step_mm <= 0.0 {
                return Err(ScanError::MissingStep);
            }
            if !wait_time_constants.is_finite() || wait_time_constants <= 0.0 {
                return Err(ScanError::MissingWait);
            }
        }
        Ok(())
    }

    pub fn travel_mm(&self) -> f64 {
        self.start_mm - self.end_mm
    }

    pub fn is_fast(&self) -> bool {
        matches!(self.mode, ScanMode::Fast)
    }

    /// Tag used in archived filenames.
    pub fn mode_tag(&self) -> &'static str {
        match self.mode {
            ScanMode::Fast => "fastscan",
            ScanMode::Stepped { .. } => "steppedscan",
        }
    }
}

/// Free-text labels carried into archived filenames.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScanLabels {
    pub setup: String,
    pub sample: String,
    pub notes: String,
}

/// Lock-in state captured when the scan is armed.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct LockinSettings {
    pub sensitivity_na: f64,
    pub time_constant_s: f64,
    pub chop_freq_hz: f64,
}

/// Everything a scan run needs, round-tripped through a JSON preset file
/// and saved next to each recorded scan.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Preset {
    pub scan: ScanConfig,
    #[serde(default)]
    pub labels: ScanLabels,
    pub lockin: LockinSettings,
}

impl Preset {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ScanError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

use std::time::Duration;

use thiserror::Error;

/// Failure of a single instrument request.
#[derive(Debug, Error)]
pub enum InstrumentError {
    #[error("device is not connected")]
    Disconnected,
    #[error("no reply within {0:?}")]
    Timeout(Duration),
    #[error("malformed reply: {0:?}")]
    BadReply(String),
    #[error(transparent)]
    Serial(#[from] serialport::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl InstrumentError {
    /// Timeout-class failures may succeed on a later attempt; everything
    /// else means the device is effectively gone.
    pub fn is_transient(&self) -> bool {
        matches!(self, InstrumentError::Timeout(_))
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan must move toward decreasing position: start {start} mm, end {end} mm")]
    InvalidBounds { start: f64, end: f64 },
    #[error("velocity must be positive and finite, got {0} mm/s")]
    InvalidVelocity(f64),
    #[error("stepped mode requires a positive step size")]
    MissingStep,
    #[error("stepped mode requires a positive settle wait")]
    MissingWait,
    #[error("{instrument}: {source}")]
    Instrument {
        instrument: &'static str,
        #[source]
        source: InstrumentError,
    },
    #[error("resampling interval must be positive and finite, got {0} ps")]
    InvalidInterval(f64),
    #[error("resampling grid of 2^{0} points is out of range")]
    GridTooLarge(u32),
    #[error("need at least two samples, got {0}")]
    InsufficientData(usize),
    #[error("malformed scan file: {0}")]
    BadScanFile(String),
    #[error("failed to render plot: {0}")]
    Plot(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("preset error: {0}")]
    Preset(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl ScanError {
    pub fn instrument(instrument: &'static str, source: InstrumentError) -> Self {
        ScanError::Instrument { instrument, source }
    }
}

impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for ScanError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        ScanError::Plot(format!("{value:?}"))
    }
}

impl From<image::ImageError> for ScanError {
    fn from(value: image::ImageError) -> Self {
        ScanError::Plot(value.to_string())
    }
}

pub mod lockin;
pub mod multimeter;
pub mod scpi;
pub mod sim;

pub use lockin::Sr830Lockin;
pub use multimeter::Multimeter;
pub use scpi::ScpiPort;
pub use sim::{SimLockin, SimStage, SimThermometer};

use std::time::Duration;

use crate::error::InstrumentError;

/// One reading from the measurement channel: a lock-in X/Y pair or a lone
/// multimeter scalar.
#[derive(Clone, Copy, Debug)]
pub struct ChannelReading {
    pub primary: f64,
    pub quadrature: Option<f64>,
}

/// Mechanical delay stage. Position is in mm, decreasing toward the scan
/// end; the stage owns its background position polling.
pub trait DelayLine {
    fn is_connected(&self) -> bool;

    fn set_velocity(&mut self, mm_per_s: f64) -> Result<(), InstrumentError>;

    /// Blocking move. A zero `timeout` issues the move and returns at once
    /// (used for the continuous fast-mode sweep).
    fn move_to(&mut self, position_mm: f64, timeout: Duration) -> Result<(), InstrumentError>;

    fn position(&mut self) -> Result<f64, InstrumentError>;

    fn start_polling(&mut self, rate: Duration) -> Result<(), InstrumentError>;

    fn stop_polling(&mut self) -> Result<(), InstrumentError>;
}

/// The signal channel sampled at every scan tick.
pub trait MeasureChannel {
    fn read(&mut self) -> Result<ChannelReading, InstrumentError>;
}

/// Secondary sensor sampled alongside the signal channel (e.g. a Cernox
/// resistance thermometer).
pub trait AuxSensor {
    fn read(&mut self) -> Result<f64, InstrumentError>;
}

impl<T: MeasureChannel + ?Sized> MeasureChannel for Box<T> {
    fn read(&mut self) -> Result<ChannelReading, InstrumentError> {
        (**self).read()
    }
}

impl<T: AuxSensor + ?Sized> AuxSensor for Box<T> {
    fn read(&mut self) -> Result<f64, InstrumentError> {
        (**self).read()
    }
}

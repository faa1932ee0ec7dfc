use std::time::Duration;

use crate::error::InstrumentError;
use crate::instruments::scpi::ScpiPort;
use crate::instruments::AuxSensor;

/// SCPI multimeter serving as the thermometer readout: the Cernox sensor
/// hangs off the four-wire resistance input.
pub struct Multimeter {
    port: ScpiPort,
}

impl Multimeter {
    pub fn connect(device: &str, baud: u32, timeout: Duration) -> Result<Self, InstrumentError> {
        let mut port = ScpiPort::open(device, baud, timeout)?;
        let idn = port.identify()?;
        log::info!("connected multimeter: {idn}");
        Ok(Self { port })
    }

    pub fn four_wire_resistance(&mut self) -> Result<f64, InstrumentError> {
        self.port.query_f64("MEAS:FRES?")
    }
}

impl AuxSensor for Multimeter {
    fn read(&mut self) -> Result<f64, InstrumentError> {
        self.four_wire_resistance()
    }
}

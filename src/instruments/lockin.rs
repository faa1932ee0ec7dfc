use std::time::Duration;

use crate::error::InstrumentError;
use crate::instruments::scpi::{parse_pair, ScpiPort};
use crate::instruments::{ChannelReading, MeasureChannel};

/// SR830-class lock-in amplifier over SCPI.
pub struct Sr830Lockin {
    port: ScpiPort,
}

/// `SENS?` index to full-scale sensitivity, nA. The instrument reports an
/// index into its discrete range table; only the current-input rows the rig
/// uses are mapped here.
pub fn sensitivity_na(index: u32) -> Option<f64> {
    let value = match index {
        17 => 1.0,
        18 => 2.0,
        19 => 5.0,
        20 => 10.0,
        21 => 20.0,
        22 => 50.0,
        23 => 100.0,
        24 => 200.0,
        25 => 500.0,
        26 => 1000.0,
        _ => return None,
    };
    Some(value)
}

/// `OFLT?` index to time constant, seconds.
pub fn time_constant_s(index: u32) -> Option<f64> {
    const TABLE: [f64; 20] = [
        10e-6, 30e-6, 100e-6, 300e-6, 1e-3, 3e-3, 10e-3, 30e-3, 100e-3, 300e-3, 1.0, 3.0, 10.0,
        30.0, 100.0, 300.0, 1e3, 3e3, 10e3, 30e3,
    ];
    TABLE.get(index as usize).copied()
}

impl Sr830Lockin {
    pub fn connect(device: &str, baud: u32, timeout: Duration) -> Result<Self, InstrumentError> {
        let mut port = ScpiPort::open(device, baud, timeout)?;
        let idn = port.identify()?;
        log::info!("connected lock-in: {idn}");
        Ok(Self { port })
    }

    /// Simultaneous X/Y snapshot.
    pub fn xy(&mut self) -> Result<(f64, f64), InstrumentError> {
        let reply = self.port.query("SNAP?1,2")?;
        parse_pair(&reply)
    }

    pub fn chop_freq_hz(&mut self) -> Result<f64, InstrumentError> {
        self.port.query_f64("FREQ?")
    }

    pub fn sensitivity_na(&mut self) -> Result<f64, InstrumentError> {
        let reply = self.port.query("SENS?")?;
        let index: u32 = reply
            .trim()
            .parse()
            .map_err(|_| InstrumentError::BadReply(reply.clone()))?;
        sensitivity_na(index).ok_or(InstrumentError::BadReply(reply))
    }

    pub fn time_constant_s(&mut self) -> Result<f64, InstrumentError> {
        let reply = self.port.query("OFLT?")?;
        let index: u32 = reply
            .trim()
            .parse()
            .map_err(|_| InstrumentError::BadReply(reply.clone()))?;
        time_constant_s(index).ok_or(InstrumentError::BadReply(reply))
    }
}

impl MeasureChannel for Sr830Lockin {
    fn read(&mut self) -> Result<ChannelReading, InstrumentError> {
        let (x, y) = self.xy()?;
        Ok(ChannelReading {
            primary: x,
            quadrature: Some(y),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensitivity_table_covers_current_ranges() {
        assert_eq!(sensitivity_na(17), Some(1.0));
        assert_eq!(sensitivity_na(22), Some(50.0));
        assert_eq!(sensitivity_na(26), Some(1000.0));
        assert_eq!(sensitivity_na(16), None);
        assert_eq!(sensitivity_na(27), None);
    }

    #[test]
    fn time_constant_table_spans_decades() {
        assert_eq!(time_constant_s(0), Some(10e-6));
        assert_eq!(time_constant_s(8), Some(100e-3));
        assert_eq!(time_constant_s(10), Some(1.0));
        assert_eq!(time_constant_s(19), Some(30e3));
        assert_eq!(time_constant_s(20), None);
    }
}

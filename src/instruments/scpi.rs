use std::io::{Read, Write};
use std::time::Duration;

use serialport::SerialPort;

use crate::error::InstrumentError;

const TERMINATOR: u8 = b'\n';

/// Newline-terminated SCPI request/response transport over a serial port.
pub struct ScpiPort {
    port: Box<dyn SerialPort>,
    timeout: Duration,
}

impl ScpiPort {
    pub fn open(device: &str, baud: u32, timeout: Duration) -> Result<Self, InstrumentError> {
        let port = serialport::new(device, baud).timeout(timeout).open()?;
        log::debug!("opened SCPI port {device} at {baud} baud");
        Ok(Self { port, timeout })
    }

    pub fn write_line(&mut self, command: &str) -> Result<(), InstrumentError> {
        self.port.write_all(command.as_bytes())?;
        self.port.write_all(&[TERMINATOR])?;
        self.port.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, InstrumentError> {
        let mut reply = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match self.port.read(&mut byte) {
                Ok(0) => return Err(InstrumentError::Disconnected),
                Ok(_) if byte[0] == TERMINATOR => break,
                Ok(_) => reply.push(byte[0]),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    return Err(InstrumentError::Timeout(self.timeout))
                }
                Err(e) => return Err(e.into()),
            }
        }
        String::from_utf8(reply)
            .map(|s| s.trim().to_owned())
            .map_err(|e| InstrumentError::BadReply(format!("{e}")))
    }

    pub fn query(&mut self, command: &str) -> Result<String, InstrumentError> {
        self.write_line(command)?;
        self.read_line()
    }

    pub fn query_f64(&mut self, command: &str) -> Result<f64, InstrumentError> {
        let reply = self.query(command)?;
        parse_f64(&reply)
    }

    pub fn identify(&mut self) -> Result<String, InstrumentError> {
        self.query("*IDN?")
    }
}

pub fn parse_f64(reply: &str) -> Result<f64, InstrumentError> {
    reply
        .trim()
        .parse()
        .map_err(|_| InstrumentError::BadReply(reply.to_owned()))
}

/// Split a comma-separated two-value reply, e.g. the lock-in `SNAP?1,2`.
pub fn parse_pair(reply: &str) -> Result<(f64, f64), InstrumentError> {
    let mut parts = reply.split(',');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), None) => Ok((parse_f64(a)?, parse_f64(b)?)),
        _ => Err(InstrumentError::BadReply(reply.to_owned())),
    }
}

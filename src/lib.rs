//! Pump-probe THz time-domain spectroscopy: delay-line scan engine plus the
//! time/frequency analysis pipeline every saved scan passes through.

pub mod analysis;
pub mod config;
pub mod error;
pub mod instruments;
pub mod scan;

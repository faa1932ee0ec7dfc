//! Simulated rig used by `scan --sim` and the controller tests: a kinematic
//! delay stage plus a lock-in that sees a THz-like pulse as a function of
//! stage position.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::error::InstrumentError;
use crate::instruments::{AuxSensor, ChannelReading, DelayLine, MeasureChannel};

/// Delay stage that integrates its commanded velocity toward the current
/// target in real time. The latest position is mirrored into a shared cell
/// so the simulated instruments can depend on it.
pub struct SimStage {
    position_mm: f64,
    target_mm: f64,
    velocity_mm_per_s: f64,
    noise_mm: f64,
    last_update: Instant,
    polling: bool,
    shared: Rc<Cell<f64>>,
}

impl SimStage {
    pub fn new(initial_mm: f64) -> Self {
        let shared = Rc::new(Cell::new(initial_mm));
        Self {
            position_mm: initial_mm,
            target_mm: initial_mm,
            velocity_mm_per_s: 1.0,
            noise_mm: 5e-5,
            last_update: Instant::now(),
            polling: false,
            shared,
        }
    }

    /// Cell mirroring the stage position, for wiring up simulated
    /// detectors.
    pub fn position_cell(&self) -> Rc<Cell<f64>> {
        Rc::clone(&self.shared)
    }

    fn advance(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_update).as_secs_f64();
        self.last_update = now;
        let travel = self.velocity_mm_per_s * dt;
        let gap = self.target_mm - self.position_mm;
        if gap.abs() <= travel {
            self.position_mm = self.target_mm;
        } else {
            self.position_mm += travel * gap.signum();
        }
        self.shared.set(self.position_mm);
    }

    fn jitter(&self) -> f64 {
        if self.noise_mm > 0.0 {
            rand::thread_rng().gen_range(-self.noise_mm..self.noise_mm)
        } else {
            0.0
        }
    }
}

impl DelayLine for SimStage {
    fn is_connected(&self) -> bool {
        true
    }

    fn set_velocity(&mut self, mm_per_s: f64) -> Result<(), InstrumentError> {
        self.advance();
        self.velocity_mm_per_s = mm_per_s.abs();
        Ok(())
    }

    fn move_to(&mut self, position_mm: f64, timeout: Duration) -> Result<(), InstrumentError> {
        self.advance();
        self.target_mm = position_mm;
        if !timeout.is_zero() {
            // blocking move: settle instantly in simulation
            self.position_mm = position_mm;
            self.shared.set(self.position_mm);
        }
        Ok(())
    }

    fn position(&mut self) -> Result<f64, InstrumentError> {
        self.advance();
        Ok(self.position_mm + self.jitter())
    }

    fn start_polling(&mut self, rate: Duration) -> Result<(), InstrumentError> {
        self.polling = true;
        log::debug!("sim stage polling started at {rate:?}");
        Ok(())
    }

    fn stop_polling(&mut self) -> Result<(), InstrumentError> {
        self.polling = false;
        log::debug!("sim stage polling stopped");
        Ok(())
    }
}

/// Shape of the synthetic pulse the simulated lock-in reports, expressed
/// against absolute stage position.
#[derive(Clone, Copy, Debug)]
pub struct PulseShape {
    pub center_mm: f64,
    pub width_mm: f64,
    pub period_mm: f64,
    pub amplitude_v: f64,
}

impl Default for PulseShape {
    fn default() -> Self {
        Self {
            center_mm: 5.0,
            width_mm: 0.5,
            period_mm: 0.15,
            amplitude_v: 4.0,
        }
    }
}

pub struct SimLockin {
    position: Rc<Cell<f64>>,
    pulse: PulseShape,
    noise_v: f64,
}

impl SimLockin {
    pub fn new(position: Rc<Cell<f64>>, pulse: PulseShape) -> Self {
        Self {
            position,
            pulse,
            noise_v: 1e-3,
        }
    }
}

impl MeasureChannel for SimLockin {
    fn read(&mut self) -> Result<ChannelReading, InstrumentError> {
        let u = self.position.get() - self.pulse.center_mm;
        let envelope = (-(u / self.pulse.width_mm).powi(2)).exp();
        let phase = std::f64::consts::TAU * u / self.pulse.period_mm;
        let mut rng = rand::thread_rng();
        let x = self.pulse.amplitude_v * envelope * phase.cos()
            + rng.gen_range(-self.noise_v..self.noise_v);
        let y = self.pulse.amplitude_v * envelope * phase.sin()
            + rng.gen_range(-self.noise_v..self.noise_v);
        Ok(ChannelReading {
            primary: x,
            quadrature: Some(y),
        })
    }
}

pub struct SimThermometer {
    base_ohms: f64,
    noise_ohms: f64,
}

impl SimThermometer {
    pub fn new(base_ohms: f64) -> Self {
        Self {
            base_ohms,
            noise_ohms: 0.5,
        }
    }
}

impl AuxSensor for SimThermometer {
    fn read(&mut self) -> Result<f64, InstrumentError> {
        let noise = rand::thread_rng().gen_range(-self.noise_ohms..self.noise_ohms);
        Ok(self.base_ohms + noise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn blocking_move_settles_on_target() {
        let mut stage = SimStage::new(10.0);
        stage.move_to(7.5, Duration::from_secs(60)).unwrap();
        let pos = stage.position().unwrap();
        assert!((pos - 7.5).abs() < 1e-3);
    }

    #[test]
    fn nonblocking_move_travels_at_set_velocity() {
        let mut stage = SimStage::new(1.0);
        stage.set_velocity(2.0).unwrap();
        stage.move_to(0.0, Duration::ZERO).unwrap();
        thread::sleep(Duration::from_millis(100));
        let pos = stage.position().unwrap();
        assert!(pos < 1.0, "stage did not move, still at {pos}");
        assert!(pos > 0.3, "stage moved too far: {pos}");
        // long enough to cross the whole travel
        thread::sleep(Duration::from_millis(600));
        let pos = stage.position().unwrap();
        assert!(pos.abs() < 1e-3, "stage overshot target: {pos}");
    }

    #[test]
    fn lockin_peaks_at_pulse_center() {
        let stage = SimStage::new(5.0);
        let pulse = PulseShape::default();
        let mut lockin = SimLockin::new(stage.position_cell(), pulse);
        let reading = lockin.read().unwrap();
        assert!((reading.primary - pulse.amplitude_v).abs() < 0.1);
        let far = SimStage::new(50.0);
        let mut lockin = SimLockin::new(far.position_cell(), pulse);
        assert!(lockin.read().unwrap().primary.abs() < 0.1);
    }
}

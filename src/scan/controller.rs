use std::thread;
use std::time::{Duration, Instant};

use crate::config::{LockinSettings, ScanConfig, ScanMode};
use crate::error::ScanError;
use crate::instruments::{AuxSensor, DelayLine, MeasureChannel};
use crate::scan::buffer::{RawSample, ScanBuffer};
use crate::scan::live_view::LiveView;
use crate::scan::record::{assemble, ScanRecord};

/// Software sample period of the continuous (fast) mode.
pub const FAST_SAMPLE_PERIOD: Duration = Duration::from_millis(100);

/// Background position polling rate while a scan is active.
pub const POLL_RATE: Duration = Duration::from_millis(10);

/// Stage velocity for the return-to-start move before a scan.
const RETURN_VELOCITY_MM_PER_S: f64 = 100.0;

/// Timeout for blocking stage moves.
const MOVE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Homing,
    Scanning,
    Finalizing,
}

/// Commanded stepped-mode position sequence: from `start` toward `end`
/// (exclusive) with stride `-step`.
pub fn commanded_positions(start: f64, end: f64, step: f64) -> Vec<f64> {
    let n = ((start - end) / step).ceil() as usize;
    (0..n).map(|i| start - i as f64 * step).collect()
}

/// Drives one scan at a time: homes the stage, runs the timed sampling
/// loop, and hands the filled buffer to the record assembler. Owns its
/// instrument handles; a read failure aborts the scan and surfaces as a
/// typed error.
pub struct ScanController<D, M, A, V> {
    delay_line: D,
    channel: M,
    aux: A,
    view: V,
    phase: ScanPhase,
}

impl<D, M, A, V> ScanController<D, M, A, V>
where
    D: DelayLine,
    M: MeasureChannel,
    A: AuxSensor,
    V: LiveView,
{
    pub fn new(delay_line: D, channel: M, aux: A, view: V) -> Self {
        Self {
            delay_line,
            channel,
            aux,
            view,
            phase: ScanPhase::Idle,
        }
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Run one scan to completion. The config is validated before any
    /// stage command is issued.
    pub fn run(
        &mut self,
        config: &ScanConfig,
        lockin: &LockinSettings,
    ) -> Result<ScanRecord, ScanError> {
        config.validate()?;
        let result = self.run_validated(config, lockin);
        if let Err(ref e) = result {
            log::warn!("scan aborted: {e}");
        }
        self.set_phase(ScanPhase::Idle);
        result
    }

    fn run_validated(
        &mut self,
        config: &ScanConfig,
        lockin: &LockinSettings,
    ) -> Result<ScanRecord, ScanError> {
        self.set_phase(ScanPhase::Homing);
        self.stage(|d| d.set_velocity(RETURN_VELOCITY_MM_PER_S))?;
        self.stage(|d| d.move_to(config.start_mm, MOVE_TIMEOUT))?;
        self.stage(|d| d.start_polling(POLL_RATE))?;
        self.stage(|d| d.set_velocity(config.velocity_mm_per_s))?;

        self.set_phase(ScanPhase::Scanning);
        let (buffer, commanded) = match config.mode {
            ScanMode::Fast => (self.scan_fast(config)?, None),
            ScanMode::Stepped {
                step_mm,
                wait_time_constants,
            } => {
                let targets = commanded_positions(config.start_mm, config.end_mm, step_mm);
                let settle =
                    Duration::from_secs_f64(wait_time_constants * lockin.time_constant_s);
                let buffer = self.scan_stepped(&targets, settle)?;
                (buffer, Some(targets))
            }
        };

        self.set_phase(ScanPhase::Finalizing);
        self.stage(|d| d.stop_polling())?;
        // the final trace shows the record's position column, which in
        // stepped mode is the commanded sequence
        let record = assemble(&buffer, commanded.as_deref());
        self.view
            .finalize(record.position_mm.clone(), record.x.clone());
        Ok(record)
    }

    /// Continuous sweep: one fire-and-forget move to the end position, then
    /// samples on a drift-corrected software timer until the expected count
    /// is reached or the read-back position crosses the end.
    fn scan_fast(&mut self, config: &ScanConfig) -> Result<ScanBuffer, ScanError> {
        let dt = FAST_SAMPLE_PERIOD.as_secs_f64();
        let n = ((config.travel_mm() / config.velocity_mm_per_s) / dt).floor() as usize;
        log::info!(
            "fast scan: {} -> {} mm at {} mm/s, {n} samples",
            config.start_mm,
            config.end_mm,
            config.velocity_mm_per_s
        );
        let mut buffer = ScanBuffer::with_capacity(n);
        self.stage(|d| d.move_to(config.end_mm, Duration::ZERO))?;
        let t0 = Instant::now();
        for i in 0..n {
            // sleep to the next dt boundary so loop overhead cannot
            // accumulate into timing drift
            let elapsed = t0.elapsed().as_secs_f64();
            thread::sleep(Duration::from_secs_f64(dt - elapsed % dt));

            let sample = self.acquire()?;
            buffer.write(i, sample);
            self.view
                .update(buffer.positions().to_vec(), buffer.x().to_vec());
            if sample.position_mm <= config.end_mm {
                buffer.truncate(i + 1);
                log::info!("reached scan end after {} samples", i + 1);
                break;
            }
        }
        Ok(buffer)
    }

    /// Discrete sweep: blocking move to each commanded position, settle for
    /// the configured multiple of the lock-in time constant, then sample.
    fn scan_stepped(
        &mut self,
        targets: &[f64],
        settle: Duration,
    ) -> Result<ScanBuffer, ScanError> {
        log::info!(
            "stepped scan: {} positions, settle {:?}",
            targets.len(),
            settle
        );
        let mut buffer = ScanBuffer::with_capacity(targets.len());
        for (i, &target) in targets.iter().enumerate() {
            self.stage(|d| d.move_to(target, MOVE_TIMEOUT))?;
            thread::sleep(settle);
            let sample = self.acquire()?;
            buffer.write(i, sample);
            self.view
                .update(buffer.positions().to_vec(), buffer.x().to_vec());
        }
        Ok(buffer)
    }

    /// One acquisition tick: position, channel(s), aux sensor.
    fn acquire(&mut self) -> Result<RawSample, ScanError> {
        let position_mm = self
            .delay_line
            .position()
            .map_err(|e| ScanError::instrument("delay line", e))?;
        let reading = self
            .channel
            .read()
            .map_err(|e| ScanError::instrument("measurement channel", e))?;
        let aux = self
            .aux
            .read()
            .map_err(|e| ScanError::instrument("aux sensor", e))?;
        Ok(RawSample {
            position_mm,
            primary: reading.primary,
            quadrature: reading.quadrature.unwrap_or(f64::NAN),
            aux,
        })
    }

    fn stage<T>(
        &mut self,
        op: impl FnOnce(&mut D) -> Result<T, crate::error::InstrumentError>,
    ) -> Result<T, ScanError> {
        op(&mut self.delay_line).map_err(|e| ScanError::instrument("delay line", e))
    }

    fn set_phase(&mut self, phase: ScanPhase) {
        if self.phase != phase {
            log::debug!("scan phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }
}

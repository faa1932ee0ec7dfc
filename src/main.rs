use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use terascan::analysis::{ResampleConfig, ScanDataset};
use terascan::config::{LockinSettings, Preset};
use terascan::instruments::sim::PulseShape;
use terascan::instruments::{
    AuxSensor, MeasureChannel, Multimeter, SimLockin, SimStage, SimThermometer, Sr830Lockin,
};
use terascan::scan::{Archive, LogView, ScanController};

const SCPI_BAUD: u32 = 9600;
const SCPI_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Parser)]
#[command(
    name = "terascan",
    about = "THz time-domain delay scans and their analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a delay-line scan and archive the result.
    Scan {
        /// JSON preset with scan, label and lock-in parameters.
        #[arg(long)]
        config: PathBuf,
        /// Archive root for the data/info/plot folders.
        #[arg(long, default_value = "output")]
        out: PathBuf,
        /// Use the simulated stage and detectors.
        #[arg(long)]
        sim: bool,
        /// Serial device of a real lock-in to sample instead of the
        /// simulated one.
        #[arg(long)]
        lockin_port: Option<String>,
        /// Serial device of a real multimeter for the aux sensor.
        #[arg(long)]
        meter_port: Option<String>,
    },
    /// Offline analysis of a previously recorded scan file.
    Analyze {
        /// Tab-separated scan file (needs t and X columns).
        file: PathBuf,
        /// Target sampling interval, ps.
        #[arg(long)]
        dt: f64,
        /// Drop samples past this time before gridding, ps.
        #[arg(long)]
        max: Option<f64>,
        /// Truncate the grid to 2^POW points.
        #[arg(long)]
        pow: Option<u32>,
        #[arg(long, default_value = "output/analysis")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    match Cli::parse().command {
        Command::Scan {
            config,
            out,
            sim,
            lockin_port,
            meter_port,
        } => run_scan(&config, &out, sim, lockin_port, meter_port),
        Command::Analyze {
            file,
            dt,
            max,
            pow,
            out,
        } => run_analysis(&file, dt, max, pow, &out),
    }
}

fn run_scan(
    config: &PathBuf,
    out: &PathBuf,
    sim: bool,
    lockin_port: Option<String>,
    meter_port: Option<String>,
) -> Result<()> {
    if !sim {
        // the rig's stage speaks a vendor-specific protocol with no open
        // driver; only the simulated stage backend can drive a scan here
        bail!("no hardware stage backend is available; rerun with --sim");
    }
    let mut preset = Preset::load(config)
        .with_context(|| format!("failed to load preset {}", config.display()))?;

    let stage = SimStage::new(preset.scan.start_mm + 1.0);

    let channel: Box<dyn MeasureChannel> = match &lockin_port {
        Some(device) => {
            let mut lockin = Sr830Lockin::connect(device, SCPI_BAUD, SCPI_TIMEOUT)?;
            // arm the scan with the lock-in's actual state so the archived
            // info file matches the hardware
            preset.lockin = LockinSettings {
                sensitivity_na: lockin.sensitivity_na()?,
                time_constant_s: lockin.time_constant_s()?,
                chop_freq_hz: lockin.chop_freq_hz()?,
            };
            Box::new(lockin)
        }
        None => {
            let pulse = PulseShape {
                center_mm: 0.5 * (preset.scan.start_mm + preset.scan.end_mm),
                ..Default::default()
            };
            Box::new(SimLockin::new(stage.position_cell(), pulse))
        }
    };

    let aux: Box<dyn AuxSensor> = match &meter_port {
        Some(device) => Box::new(Multimeter::connect(device, SCPI_BAUD, SCPI_TIMEOUT)?),
        None => Box::new(SimThermometer::new(112.0)),
    };

    let mut controller = ScanController::new(stage, channel, aux, LogView::new());
    let record = controller.run(&preset.scan, &preset.lockin)?;

    let archive = Archive::create(out)?;
    let stem = archive.save(&record, &preset)?;
    println!("saved scan as {stem}");
    Ok(())
}

fn run_analysis(
    file: &PathBuf,
    dt: f64,
    max: Option<f64>,
    pow: Option<u32>,
    out: &PathBuf,
) -> Result<()> {
    let cfg = ResampleConfig {
        dt,
        cut_max: max,
        pow2: pow,
    };
    let dataset = ScanDataset::load(file, &cfg)
        .with_context(|| format!("failed to analyze {}", file.display()))?;

    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scan".to_owned());
    dataset.save(out, &stem)?;

    if let Some(k) = dataset.freq_dom.peak_bin() {
        println!(
            "{}: {} uniform samples, spectral peak {:.4} nA at {:.4} THz",
            stem,
            dataset.time_dom.len(),
            dataset.freq_dom.ampl[k],
            dataset.freq_dom.freq[k],
        );
    }
    Ok(())
}

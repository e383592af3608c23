//! FMS Bridge CLI Application
//!
//! Host process for the fms-bridge library. It adds:
//! - TOML configuration loading and validation
//! - Logging setup
//! - Fixed-interval scheduling of sync passes
//!
//! Construction errors (bad configuration, invalid identifiers, unusable base
//! addresses) end the process before the first pass is scheduled.

use anyhow::{Context, Result};
use clap::Parser;
use fms_bridge::{SourceClient, SyncEngine, TargetClient, VehicleMapping};
use std::path::PathBuf;
use std::process::ExitCode;

mod config;
mod scheduler;

use config::AppConfig;
use scheduler::Scheduler;

/// FMS Bridge - Mirror vehicle status from a status-tracking service into a dispatch service
#[derive(Parser, Debug)]
#[command(name = "fms-bridge")]
#[command(about = "Mirror vehicle status between two fleet services", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    /// Run the initial sync once and exit
    #[arg(long)]
    once: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("FMS Bridge v{}", env!("CARGO_PKG_VERSION"));

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            log::error!("Fatal error, shutting down: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    log::info!("Loading configuration from: {:?}", args.config);
    let config = config::load_config(&args.config)?;
    log::debug!("Configuration loaded successfully");

    let engine = build_engine(&config)?;

    if args.once {
        let summary = engine.initial_sync()?;
        for (report, error) in summary.failures() {
            log::error!("{} -> {}: {}", report.source_id, report.target_id, error);
        }
        return Ok(if summary.is_clean() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let (scheduler, _stop) = Scheduler::new(config.interval());
    let stats = scheduler.run(&engine);
    log::info!(
        "FMS Bridge stopped after {} pass(es), {} vehicle failure(s)",
        stats.passes,
        stats.vehicle_failures
    );

    Ok(ExitCode::SUCCESS)
}

/// Construct clients, mapping and engine from validated configuration
fn build_engine(config: &AppConfig) -> Result<SyncEngine<SourceClient, TargetClient>> {
    let source = SourceClient::new(&config.source_client()).context("Invalid source settings")?;
    let target = TargetClient::new(&config.target_client()).context("Invalid target settings")?;
    let mapping = VehicleMapping::new(config.sync.source_ids.ids(), config.sync.target_ids.ids())
        .context("Invalid vehicle id mapping")?;

    log::info!(
        "Mapped {} vehicle(s), change policy {:?}",
        mapping.len(),
        config.change_policy()
    );

    Ok(SyncEngine::new(source, target, mapping).with_change_policy(config.change_policy()))
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

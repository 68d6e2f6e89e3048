use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use typebus_logger::Logger;
use typebus_relay::{load_config, run};

/// Publishes synthetic temperature readings over a typebus and prints a
/// summary of what the subscribed components observed.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to a TOML, YAML or JSON config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides `sensor.readings`.
    #[arg(short, long)]
    readings: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config =
        load_config(args.config.as_deref()).context("Critical: Configuration is malformed")?;
    if let Some(readings) = args.readings {
        config.sensor.readings = readings;
    }

    let _log = Logger::init(&config.log).context("Critical: Logger initialization failed")?;
    if let Some(path) = &args.config {
        info!("Loaded config from {}", path.display());
    }

    let summary = run(&config)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{summary}");
    }
    Ok(())
}

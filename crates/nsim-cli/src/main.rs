//! # nsim - partitioned neuron/nerve signal simulator
//!
//! Command-line entry point: parses arguments, installs logging and runs
//! the simulation, exiting non-zero on failure.

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nsim_cli::NsimCli;

fn main() {
    let cli = NsimCli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    };

    // -v wins, then RUST_LOG, then the config file, then info
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(config.log_level.as_deref().unwrap_or("info"))
        })
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(err) = cli.execute(config) {
        error!("Simulation failed: {}", err);
        std::process::exit(1);
    }
}

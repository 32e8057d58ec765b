//! Command-line surface of the simulator

use std::path::PathBuf;

use clap::Parser;

use crate::config::CliConfig;
use crate::error::CliResult;

pub mod run;

/// nsim - partitioned neuron/nerve signal simulator
#[derive(Parser, Debug)]
#[command(
    name = "nsim",
    version,
    about = "Partitioned neuron/nerve signal simulator",
    long_about = "Loads a brain graph of neurons, nerves and weighted edges, splits it \
                  across worker threads and propagates randomly excited signals for a \
                  fixed number of ticks. The coordinator writes a summary report of \
                  per-nerve and per-neuron signal counts."
)]
pub struct NsimCli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (TOML) providing defaults for the flags below
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub run: run::RunCommand,
}

impl NsimCli {
    /// Read the config file named by `--config`, or an empty config
    pub fn load_config(&self) -> CliResult<CliConfig> {
        match &self.config {
            Some(path) => CliConfig::load_from_file(path),
            None => Ok(CliConfig::default()),
        }
    }

    /// Execute the simulation
    pub fn execute(self, config: CliConfig) -> CliResult<()> {
        self.run.execute(&config)
    }
}

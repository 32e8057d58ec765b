//! The simulation run itself

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, ValueEnum};
use nsim_runtime::{
    load_graph, run_cluster, NervePolicy, SimulationParams, SimulationSummary, REPORT_FILENAME,
    TICK_LENGTH_SECS,
};
use tracing::info;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

/// Nerve update policy as spelled on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Every worker updates every nerve
    AllWorkers,
    /// Only the owning worker updates a nerve
    OwnerOnly,
}

impl From<PolicyArg> for NervePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::AllWorkers => NervePolicy::AllWorkers,
            PolicyArg::OwnerOnly => NervePolicy::OwnerOnly,
        }
    }
}

/// Arguments of a simulation run
#[derive(Args, Debug)]
pub struct RunCommand {
    /// Brain graph definition file
    pub graph_file: PathBuf,

    /// Number of ticks to simulate (0 only writes the report)
    pub tick_count: u64,

    /// Number of worker threads
    #[arg(short, long, env = "NSIM_WORKERS")]
    pub workers: Option<usize>,

    /// Seed for reproducible random draws
    #[arg(long)]
    pub seed: Option<u64>,

    /// Seconds of wall-clock time per tick
    #[arg(long)]
    pub tick_length: Option<u64>,

    /// Which workers update each nerve
    #[arg(long, value_enum)]
    pub nerve_policy: Option<PolicyArg>,

    /// Report output path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pause between the final drains, in milliseconds
    #[arg(long)]
    pub quiescence_ms: Option<u64>,
}

/// Fully resolved run settings
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Worker thread count
    pub workers: usize,
    /// Output file
    pub output: PathBuf,
    /// Scheduler parameters
    pub params: SimulationParams,
}

impl RunCommand {
    /// Merge flags over the config file over built-in defaults
    pub fn resolve(&self, config: &CliConfig) -> CliResult<RunSettings> {
        let workers = self.workers.or(config.workers).unwrap_or(1);
        if workers == 0 {
            return Err(CliError::invalid_args("--workers must be at least 1"));
        }

        let output = self
            .output
            .clone()
            .or_else(|| config.output.clone())
            .unwrap_or_else(|| PathBuf::from(REPORT_FILENAME));

        let nerve_policy = self
            .nerve_policy
            .map(NervePolicy::from)
            .or(config.nerve_policy)
            .unwrap_or_default();

        let quiescence_ms = self.quiescence_ms.or(config.quiescence_ms);

        let mut params = SimulationParams::new(self.tick_count)?
            .with_tick_length(self.tick_length.or(config.tick_length).unwrap_or(TICK_LENGTH_SECS))
            .with_nerve_policy(nerve_policy)
            .with_report_path(output.clone());
        if let Some(seed) = self.seed.or(config.seed) {
            params = params.with_seed(seed);
        }
        if let Some(ms) = quiescence_ms {
            params = params.with_quiescence(Duration::from_millis(ms));
        }
        params.validate()?;

        Ok(RunSettings {
            workers,
            output,
            params,
        })
    }

    /// Load the graph, run the simulation and print the completion lines
    pub fn execute(&self, config: &CliConfig) -> CliResult<()> {
        let settings = self.resolve(config)?;
        let graph = load_graph(&self.graph_file)?;

        println!();
        println!("--- Partitioned Brain Simulation ---");
        println!(
            "Workers: {} | Brain Nodes: {} | Simulating {} ticks",
            settings.workers,
            graph.node_count(),
            self.tick_count
        );
        info!(
            "Tick length {}s, nerve policy {:?}",
            settings.params.tick_length_secs, settings.params.nerve_policy
        );

        let summary = run_cluster(graph, settings.params, settings.workers)?;
        print_completion(&summary, &settings.output);
        Ok(())
    }
}

fn print_completion(summary: &SimulationSummary, output: &std::path::Path) {
    println!();
    println!(" Simulation complete.");
    println!(" Report saved to: {}", output.display());
    println!(
        " Iterations: {} (max {}/tick, min {}/tick)",
        summary.rate.total_iterations, summary.rate.max_per_tick, summary.rate.min_per_tick
    );
    println!(
        " Total simulation time: {:.6} seconds",
        summary.wall_time.as_secs_f64()
    );
    if summary.stats.total_dropped() > 0 {
        info!("Dropped signals: {}", summary.stats);
    }
}

//! Partitioned, time-stepped runtime for the neuron/nerve signal simulator
//!
//! A loaded [`BrainGraph`] is split into contiguous blocks, one per
//! worker. Workers exchange signals through a [`Transport`], advance in
//! lockstep through barriers, and finally hand their counters to the
//! coordinator, which writes the summary report.
//!
//! ```no_run
//! use nsim_runtime::{load_graph, run_cluster, SimulationParams};
//!
//! # fn main() -> nsim_runtime::Result<()> {
//! let graph = load_graph("brain.xml")?;
//! let params = SimulationParams::new(10)?.with_report_path("summary_report");
//! let summary = run_cluster(graph, params, 4)?;
//! println!("{} iterations", summary.rate.total_iterations);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export essential types from the graph crate
pub use nsim_graph::{
    load_graph, parse_graph, BrainGraph, GraphBuilder, GraphError, NeuronType, NodeId,
    NodeIndex, Signal, SignalType,
};

pub mod context;
pub mod error;
pub mod event;
pub mod partition;
pub mod report;
pub mod router;
pub mod scheduler;
pub mod state;
pub mod stats;
pub mod transport;
pub mod update;
pub mod wire;

pub use context::{NervePolicy, SimulationContext};
pub use error::{Result, RuntimeError};
pub use event::{dispatch, Dispatch, Event};
pub use partition::{PartitionTable, Resolution, Resolver, WorkerId};
pub use report::{merge_tallies, render_report, write_report, MergedCounts, NerveTally, WorkerTally};
pub use router::{drain, route, Delivery};
pub use scheduler::{
    run_cluster, ClockSource, Phase, RateStats, SimulationParams, SimulationSummary, Stimulus,
    Worker, WorkerOutcome,
};
pub use state::{Inbox, NodeState};
pub use stats::WorkerStats;
pub use transport::{ChannelMesh, ChannelTransport, Transport};
pub use update::{fire, handle_signal, update_node, update_pass, Fired};
pub use wire::WireSignal;

/// Seconds per tick unless configured otherwise
pub const TICK_LENGTH_SECS: u64 = 2;

/// Most signals a node's inbox holds at once
pub const SIGNAL_INBOX_SIZE: usize = 16384;

/// Report file name used when no path is given
pub const REPORT_FILENAME: &str = "summary_report";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_integration() {
        let graph = GraphBuilder::new()
            .add_nerve(0)
            .add_neuron(1, NeuronType::Multipolar)
            .connect(0, 1, 100.0, 1.0)
            .build()
            .unwrap();
        assert_eq!(graph.node_count(), 2);

        let params = SimulationParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(Inbox::new().capacity(), SIGNAL_INBOX_SIZE);
    }
}

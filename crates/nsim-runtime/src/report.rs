//! Aggregation of per-worker counters and the summary report

use std::fs;
use std::path::Path;

use nsim_graph::{BrainGraph, NodeIndex, NodeKind, NUM_SIGNAL_TYPES};

use crate::{
    context::SimulationContext,
    error::{Result, RuntimeError},
    partition::WorkerId,
    stats::WorkerStats,
};

/// Input and output counters of one nerve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NerveTally {
    /// Global index of the nerve
    pub index: NodeIndex,
    /// Per-type input counts
    pub inputs: [u64; NUM_SIGNAL_TYPES],
    /// Per-type output counts
    pub outputs: [u64; NUM_SIGNAL_TYPES],
}

impl NerveTally {
    /// Zeroed counters for `index`
    pub fn new(index: NodeIndex) -> Self {
        Self {
            index,
            inputs: [0; NUM_SIGNAL_TYPES],
            outputs: [0; NUM_SIGNAL_TYPES],
        }
    }

    fn accumulate(&mut self, other: &NerveTally) {
        for t in 0..NUM_SIGNAL_TYPES {
            self.inputs[t] += other.inputs[t];
            self.outputs[t] += other.outputs[t];
        }
    }
}

/// Everything one worker contributes to the final report
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerTally {
    /// Contributing worker
    pub worker: WorkerId,
    /// Global index of the first owned node
    pub start: usize,
    /// Received totals of the owned nodes, in order
    pub received: Vec<u64>,
    /// Counters of every nerve this worker updated
    pub nerve_counters: Vec<NerveTally>,
    /// Routing counters
    pub stats: WorkerStats,
}

impl WorkerTally {
    /// Tally with no owned nodes
    pub fn empty(worker: WorkerId, start: usize) -> Self {
        Self {
            worker,
            start,
            received: Vec::new(),
            nerve_counters: Vec::new(),
            stats: WorkerStats::default(),
        }
    }

    /// Snapshot the counters of a worker's context
    pub fn from_context(ctx: &SimulationContext) -> Self {
        let range = ctx.resolver.local_range();
        let received = ctx
            .states
            .get(range.clone())
            .unwrap_or_default()
            .iter()
            .map(|s| s.total_received)
            .collect();

        let nerve_counters = ctx
            .graph
            .indexed_nodes()
            .filter(|(index, node)| {
                node.is_nerve() && ctx.nerve_policy.updates(ctx.resolver.owns(*index))
            })
            .filter_map(|(index, _)| {
                ctx.state(index).map(|state| NerveTally {
                    index,
                    inputs: state.inputs,
                    outputs: state.outputs,
                })
            })
            .collect();

        Self {
            worker: ctx.worker(),
            start: range.start,
            received,
            nerve_counters,
            stats: ctx.stats,
        }
    }
}

/// Cluster-wide counters, indexed by global node index
#[derive(Debug, Clone, PartialEq)]
pub struct MergedCounts {
    /// Received totals per node
    pub received: Vec<u64>,
    /// Summed counters per nerve, `None` for neurons
    pub nerves: Vec<Option<NerveTally>>,
    /// Summed routing counters
    pub stats: WorkerStats,
}

impl MergedCounts {
    /// All-zero counts for `node_count` nodes
    pub fn zeroed(node_count: usize) -> Self {
        Self {
            received: vec![0; node_count],
            nerves: vec![None; node_count],
            stats: WorkerStats::default(),
        }
    }

    /// Counts as seen by a single context
    pub fn from_context(ctx: &SimulationContext) -> Self {
        let mut counts = Self::zeroed(ctx.graph.node_count());
        for (index, node) in ctx.graph.indexed_nodes() {
            let Some(state) = ctx.state(index) else {
                continue;
            };
            counts.received[index.as_usize()] = state.total_received;
            if node.is_nerve() {
                counts.nerves[index.as_usize()] = Some(NerveTally {
                    index,
                    inputs: state.inputs,
                    outputs: state.outputs,
                });
            }
        }
        counts.stats = ctx.stats;
        counts
    }

    /// Sum of all received totals
    pub fn total_received(&self) -> u64 {
        self.received.iter().sum()
    }
}

/// Combine worker tallies into global counts
///
/// Received totals are placed at `start + i`. Nerve counters are summed,
/// so a nerve updated by several workers reports the combined activity.
pub fn merge_tallies(node_count: usize, tallies: &[WorkerTally]) -> Result<MergedCounts> {
    let mut merged = MergedCounts::zeroed(node_count);

    for tally in tallies {
        let end = tally.start + tally.received.len();
        if end > node_count {
            return Err(RuntimeError::invalid_config(format!(
                "tally from {} covers {}..{} but the graph has {} nodes",
                tally.worker, tally.start, end, node_count
            )));
        }
        merged.received[tally.start..end].copy_from_slice(&tally.received);

        for nerve in &tally.nerve_counters {
            let slot = merged
                .nerves
                .get_mut(nerve.index.as_usize())
                .ok_or_else(|| {
                    RuntimeError::invalid_config(format!(
                        "tally from {} names nerve {} outside the graph",
                        tally.worker, nerve.index
                    ))
                })?;
            slot.get_or_insert_with(|| NerveTally::new(nerve.index))
                .accumulate(nerve);
        }

        merged.stats += tally.stats;
    }

    Ok(merged)
}

/// Render the summary report
pub fn render_report(graph: &BrainGraph, counts: &MergedCounts, ticks: u64) -> String {
    let mut out = format!(
        "Simulation ran with {} neurons, {} nerves and {} total edges until {} ns\n\n",
        graph.neuron_count(),
        graph.nerve_count(),
        graph.edge_count(),
        ticks
    );

    let zero = [0u64; NUM_SIGNAL_TYPES];
    for (k, (index, node)) in graph
        .indexed_nodes()
        .filter(|(_, node)| node.kind == NodeKind::Nerve)
        .enumerate()
    {
        out.push_str(&format!("Nerve {} (ID: {})\n", k, node.id.raw()));
        let nerve = counts.nerves.get(index.as_usize()).and_then(Option::as_ref);
        let (inputs, outputs) = nerve.map_or((&zero, &zero), |n| (&n.inputs, &n.outputs));
        for t in 0..NUM_SIGNAL_TYPES {
            out.push_str(&format!(
                "----> Type {}: {} inputs, {} outputs\n",
                t, inputs[t], outputs[t]
            ));
        }
    }
    out.push('\n');

    for (k, (index, node)) in graph
        .indexed_nodes()
        .filter(|(_, node)| node.kind.is_neuron())
        .enumerate()
    {
        out.push_str(&format!(
            "Neuron {} (ID: {}), total signals received: {}\n",
            k,
            node.id.raw(),
            counts.received.get(index.as_usize()).copied().unwrap_or(0)
        ));
    }

    out
}

/// Render the report and write it to `path`, replacing any existing file
pub fn write_report<P: AsRef<Path>>(
    path: P,
    graph: &BrainGraph,
    counts: &MergedCounts,
    ticks: u64,
) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, render_report(graph, counts, ticks))?;
    log::info!("Report written to {}", path.display());
    Ok(())
}

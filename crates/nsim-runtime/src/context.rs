//! Explicit per-worker simulation context
//!
//! Everything the router, dispatcher and update engine touch lives here
//! and is passed by `&mut`. A worker owns exactly one context; nothing in
//! it is shared with other workers except the immutable graph.

use std::sync::Arc;

use nsim_graph::{BrainGraph, NodeId, NodeIndex};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    error::{Result, RuntimeError},
    partition::{Resolver, WorkerId},
    report::MergedCounts,
    state::NodeState,
    stats::WorkerStats,
};

/// Which workers update a nerve each iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum NervePolicy {
    /// Every worker updates every nerve, owned or not
    #[default]
    AllWorkers,
    /// Only the owning worker updates a nerve
    OwnerOnly,
}

impl NervePolicy {
    /// True if `worker` should update a nerve whose owner is `owns`
    pub fn updates(&self, owns: bool) -> bool {
        match self {
            NervePolicy::AllWorkers => true,
            NervePolicy::OwnerOnly => owns,
        }
    }
}

/// State of one worker
///
/// The arena holds a slot for every node in the graph, indexed by
/// `NodeIndex`. Only the slots in the worker's local range ever receive
/// signals; nerve slots outside it are touched when the nerve policy
/// asks for shadow updates.
#[derive(Debug)]
pub struct SimulationContext {
    pub(crate) graph: Arc<BrainGraph>,
    pub(crate) resolver: Resolver,
    pub(crate) states: Vec<NodeState>,
    pub(crate) rng: StdRng,
    pub(crate) nerve_policy: NervePolicy,
    pub(crate) stats: WorkerStats,
    pub(crate) elapsed_ticks: u64,
}

impl SimulationContext {
    /// Build the context of worker `me` out of `worker_count`
    ///
    /// With a seed the RNG stream is `seed + me`, so each worker draws
    /// a distinct but reproducible sequence.
    pub fn new(
        graph: Arc<BrainGraph>,
        worker_count: usize,
        me: WorkerId,
        seed: Option<u64>,
        nerve_policy: NervePolicy,
    ) -> Result<Self> {
        let resolver = Resolver::new(Arc::clone(&graph), worker_count, me)?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(me.raw() as u64)),
            None => StdRng::from_entropy(),
        };
        let states = allocate_arena(graph.node_count())?;

        Ok(Self {
            graph,
            resolver,
            states,
            rng,
            nerve_policy,
            stats: WorkerStats::default(),
            elapsed_ticks: 0,
        })
    }

    /// Shared graph
    pub fn graph(&self) -> &Arc<BrainGraph> {
        &self.graph
    }

    /// Partition resolver for this worker
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// This worker
    pub fn worker(&self) -> WorkerId {
        self.resolver.worker()
    }

    /// Nerve update policy
    pub fn nerve_policy(&self) -> NervePolicy {
        self.nerve_policy
    }

    /// Counters so far
    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Ticks elapsed
    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }

    /// State slot for a global index
    pub fn state(&self, index: NodeIndex) -> Option<&NodeState> {
        self.states.get(index.as_usize())
    }

    /// State slot for a node identifier
    pub fn state_of(&self, id: NodeId) -> Option<&NodeState> {
        self.graph.index_of(id).and_then(|index| self.state(index))
    }

    pub(crate) fn state_mut(&mut self, index: NodeIndex) -> Option<&mut NodeState> {
        self.states.get_mut(index.as_usize())
    }

    /// Start a new tick: bump the counter and roll owned nodes' windows
    pub fn advance_tick(&mut self) {
        self.elapsed_ticks += 1;
        let range = self.resolver.local_range();
        for state in &mut self.states[range] {
            state.roll_tick();
        }
    }

    /// Overwrite counters with cluster-wide totals
    ///
    /// Used by the coordinator after gathering, so that a report rendered
    /// from this context reflects every worker.
    pub fn absorb(&mut self, merged: &MergedCounts) {
        for (index, state) in self.states.iter_mut().enumerate() {
            if let Some(&received) = merged.received.get(index) {
                state.total_received = received;
            }
            if let Some(nerve) = merged.nerves.get(index).and_then(Option::as_ref) {
                state.inputs = nerve.inputs;
                state.outputs = nerve.outputs;
            }
        }
    }

    /// Drop every inbox and the arena itself
    pub fn release(&mut self) {
        self.states = Vec::new();
    }

    /// True once `release` has run
    pub fn is_released(&self) -> bool {
        self.states.is_empty() && self.graph.node_count() > 0
    }
}

fn allocate_arena(len: usize) -> Result<Vec<NodeState>> {
    let mut states = Vec::new();
    states
        .try_reserve_exact(len)
        .map_err(|_| RuntimeError::resource_exhausted("node state arena", format!("{} slots", len)))?;
    states.resize(len, NodeState::new());
    Ok(states)
}

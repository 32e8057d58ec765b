//! Block partitioning of the global node sequence over workers
//!
//! Worker `r` of `W` owns `base + (r < extra)` consecutive nodes starting
//! at `r * base + min(r, extra)`, where `base = N / W` and `extra = N % W`.
//! Every worker recomputes the same table from `(N, W)`; nothing is
//! negotiated.

use core::fmt;
use core::ops::Range;
use std::sync::Arc;

use nsim_graph::{BrainGraph, NodeId, NodeIndex};

use crate::error::{Result, RuntimeError};

/// Identifier of a worker (rank)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(pub usize);

impl WorkerId {
    /// The worker that loads the graph and aggregates results
    pub const COORDINATOR: Self = Self(0);

    /// Create a new worker ID
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub const fn raw(&self) -> usize {
        self.0
    }

    /// True for the coordinating worker
    pub const fn is_coordinator(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W{}", self.0)
    }
}

/// Ownership ranges for `node_count` nodes over `worker_count` workers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionTable {
    node_count: usize,
    worker_count: usize,
    base: usize,
    extra: usize,
}

impl PartitionTable {
    /// Compute the table; at least one worker is required
    pub fn new(node_count: usize, worker_count: usize) -> Result<Self> {
        if worker_count == 0 {
            return Err(RuntimeError::invalid_parameter(
                "worker_count",
                worker_count.to_string(),
                ">= 1",
            ));
        }
        Ok(Self {
            node_count,
            worker_count,
            base: node_count / worker_count,
            extra: node_count % worker_count,
        })
    }

    /// Total node count
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of workers
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Number of nodes owned by `worker`
    pub fn local_count(&self, worker: WorkerId) -> usize {
        if worker.raw() >= self.worker_count {
            return 0;
        }
        self.base + usize::from(worker.raw() < self.extra)
    }

    /// Global index range owned by `worker`
    pub fn range(&self, worker: WorkerId) -> Range<usize> {
        if worker.raw() >= self.worker_count {
            return self.node_count..self.node_count;
        }
        let start = worker.raw() * self.base + worker.raw().min(self.extra);
        start..start + self.local_count(worker)
    }

    /// All ranges in worker order
    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.worker_count).map(move |w| self.range(WorkerId::new(w)))
    }

    /// Owner of a global index, `None` past the end
    pub fn owner_of_index(&self, index: NodeIndex) -> Option<WorkerId> {
        let idx = index.as_usize();
        if idx >= self.node_count {
            return None;
        }
        let boundary = self.extra * (self.base + 1);
        let owner = if idx < boundary {
            idx / (self.base + 1)
        } else {
            self.extra + (idx - boundary) / self.base
        };
        Some(WorkerId::new(owner))
    }
}

/// Where a node identifier lives relative to one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Unmapped or out-of-range identifier
    Unknown,
    /// Owned by this worker, at this arena slot
    Local(NodeIndex),
    /// Owned by another worker
    Remote(WorkerId),
}

/// Partition resolver for one worker
#[derive(Debug, Clone)]
pub struct Resolver {
    graph: Arc<BrainGraph>,
    table: PartitionTable,
    me: WorkerId,
}

impl Resolver {
    /// Build the resolver for `me` from the replicated graph
    pub fn new(graph: Arc<BrainGraph>, worker_count: usize, me: WorkerId) -> Result<Self> {
        let table = PartitionTable::new(graph.node_count(), worker_count)?;
        if me.raw() >= worker_count {
            return Err(RuntimeError::invalid_parameter(
                "worker",
                me.raw().to_string(),
                format!("< {}", worker_count),
            ));
        }
        Ok(Self { graph, table, me })
    }

    /// The worker this resolver answers for
    pub fn worker(&self) -> WorkerId {
        self.me
    }

    /// The partition table
    pub fn table(&self) -> &PartitionTable {
        &self.table
    }

    /// Global range owned by this worker
    pub fn local_range(&self) -> Range<usize> {
        self.table.range(self.me)
    }

    /// True if this worker owns `index`
    pub fn owns(&self, index: NodeIndex) -> bool {
        self.local_range().contains(&index.as_usize())
    }

    /// Owning worker of `id`, `None` if unmapped
    pub fn owner_of(&self, id: NodeId) -> Option<WorkerId> {
        self.graph
            .index_of(id)
            .and_then(|index| self.table.owner_of_index(index))
    }

    /// Resolve `id` relative to this worker
    pub fn resolve(&self, id: NodeId) -> Resolution {
        match self.graph.index_of(id) {
            None => Resolution::Unknown,
            Some(index) => match self.table.owner_of_index(index) {
                None => Resolution::Unknown,
                Some(owner) if owner == self.me => Resolution::Local(index),
                Some(owner) => Resolution::Remote(owner),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nsim_graph::{GraphBuilder, NeuronType};

    #[test]
    fn test_block_distribution() {
        let table = PartitionTable::new(10, 3).unwrap();
        assert_eq!(table.range(WorkerId::new(0)), 0..4);
        assert_eq!(table.range(WorkerId::new(1)), 4..7);
        assert_eq!(table.range(WorkerId::new(2)), 7..10);
        assert_eq!(table.local_count(WorkerId::new(0)), 4);
        assert_eq!(table.local_count(WorkerId::new(2)), 3);
    }

    #[test]
    fn test_more_workers_than_nodes() {
        let table = PartitionTable::new(2, 4).unwrap();
        assert_eq!(table.range(WorkerId::new(0)), 0..1);
        assert_eq!(table.range(WorkerId::new(1)), 1..2);
        assert!(table.range(WorkerId::new(2)).is_empty());
        assert!(table.range(WorkerId::new(3)).is_empty());
        assert_eq!(table.owner_of_index(NodeIndex::new(1)), Some(WorkerId::new(1)));
    }

    #[test]
    fn test_owner_of_index() {
        let table = PartitionTable::new(10, 3).unwrap();
        assert_eq!(table.owner_of_index(NodeIndex::new(3)), Some(WorkerId::new(0)));
        assert_eq!(table.owner_of_index(NodeIndex::new(4)), Some(WorkerId::new(1)));
        assert_eq!(table.owner_of_index(NodeIndex::new(9)), Some(WorkerId::new(2)));
        assert_eq!(table.owner_of_index(NodeIndex::new(10)), None);
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(PartitionTable::new(5, 0).is_err());
    }

    #[test]
    fn test_resolver() {
        let graph = Arc::new(
            GraphBuilder::new()
                .add_neuron(100, NeuronType::Motor)
                .add_neuron(7, NeuronType::Motor)
                .add_neuron(3, NeuronType::Motor)
                .build()
                .unwrap(),
        );
        let w0 = Resolver::new(Arc::clone(&graph), 2, WorkerId::new(0)).unwrap();
        let w1 = Resolver::new(graph, 2, WorkerId::new(1)).unwrap();

        // Indices 0,1 belong to W0; index 2 to W1
        assert_eq!(w0.resolve(NodeId::new(100)), Resolution::Local(NodeIndex::new(0)));
        assert_eq!(w0.resolve(NodeId::new(3)), Resolution::Remote(WorkerId::new(1)));
        assert_eq!(w1.resolve(NodeId::new(3)), Resolution::Local(NodeIndex::new(2)));
        assert_eq!(w1.resolve(NodeId::new(7)), Resolution::Remote(WorkerId::new(0)));
        assert_eq!(w0.resolve(NodeId::new(8)), Resolution::Unknown);
        assert_eq!(w0.resolve(NodeId::new(1 << 20)), Resolution::Unknown);
        assert_eq!(w1.owner_of(NodeId::new(100)), Some(WorkerId::new(0)));
    }

    #[test]
    fn test_resolver_rejects_foreign_worker() {
        let graph = Arc::new(GraphBuilder::new().add_nerve(0).build().unwrap());
        assert!(Resolver::new(graph, 2, WorkerId::new(2)).is_err());
    }
}

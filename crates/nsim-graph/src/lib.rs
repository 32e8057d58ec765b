//! Graph model and graph-definition loader for the nsim engine
//!
//! This crate holds everything that is fixed for the duration of a run:
//! node and edge records, the frozen graph arena, the global id-to-index
//! table, and the reader for the textual graph-definition format.

#![deny(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod error;
pub mod graph;
pub mod ids;
pub mod loader;
pub mod model;

// Re-export essential types
pub use error::{GraphError, Result};
pub use graph::{BrainGraph, GraphBuilder, IdTable};
pub use ids::{EdgeIndex, NodeId, NodeIndex};
pub use loader::{load_graph, parse_graph};
pub use model::{Direction, Edge, NeuronType, Node, NodeKind, Position, Signal, SignalType};

/// Number of distinct signal types
pub const NUM_SIGNAL_TYPES: usize = 10;

/// Exclusive upper bound on node identifiers
pub const MAX_NODE_ID: usize = 2048;

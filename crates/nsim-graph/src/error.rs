//! Error types for the graph model and loader

use thiserror::Error;

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors that can occur while building or loading a graph
#[derive(Error, Debug)]
pub enum GraphError {
    /// I/O error while reading a graph definition
    #[error("I/O error: {source}")]
    Io {
        #[from]
        /// Source I/O error
        source: std::io::Error,
    },

    /// Malformed graph definition
    #[error("Invalid format at line {line}: {reason}")]
    InvalidFormat {
        /// 1-based line number
        line: usize,
        /// Reason for invalid format
        reason: String,
    },

    /// Unrecognised neuron subtype token
    #[error("Unknown neuron type: {token}")]
    UnknownNeuronType {
        /// Offending token
        token: String,
    },

    /// Node identifier outside the supported range
    #[error("Node ID {id} exceeds max supported ({max})")]
    NodeIdOutOfRange {
        /// Node ID
        id: u32,
        /// Exclusive upper bound
        max: usize,
    },

    /// Two nodes share an identifier
    #[error("Duplicate node ID {id}")]
    DuplicateNodeId {
        /// Node ID
        id: u32,
    },

    /// Graph has no nodes
    #[error("Graph contains no nodes")]
    EmptyGraph,
}

impl GraphError {
    /// Create an invalid format error
    pub fn invalid_format(line: usize, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            line,
            reason: reason.into(),
        }
    }

    /// Create an unknown neuron type error
    pub fn unknown_neuron_type(token: impl Into<String>) -> Self {
        Self::UnknownNeuronType {
            token: token.into(),
        }
    }
}

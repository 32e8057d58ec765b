//! Error types for the simulation runtime

use thiserror::Error;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors that can occur in the simulation runtime
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Graph layer error
    #[error("Graph error: {source}")]
    Graph {
        #[from]
        /// Source graph error
        source: nsim_graph::GraphError,
    },

    /// Invalid simulation configuration
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Reason for invalid configuration
        reason: String,
    },

    /// Invalid parameter value
    #[error("Invalid parameter {parameter}: {value} (expected {constraint})")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Transport failure (peer gone, malformed frame, protocol violation)
    #[error("Transport error on worker {worker}: {reason}")]
    Transport {
        /// Worker that observed the failure
        worker: usize,
        /// Reason for failure
        reason: String,
    },

    /// A worker thread panicked
    #[error("Worker {worker} panicked")]
    WorkerPanicked {
        /// Worker index
        worker: usize,
    },

    /// Report could not be written
    #[error("I/O error: {source}")]
    Io {
        #[from]
        /// Source I/O error
        source: std::io::Error,
    },

    /// Resource exhaustion
    #[error("Resource exhausted: {resource} (limit: {limit})")]
    ResourceExhausted {
        /// Resource name
        resource: String,
        /// Resource limit
        limit: String,
    },
}

impl RuntimeError {
    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }

    /// Create a transport error
    pub fn transport(worker: usize, reason: impl Into<String>) -> Self {
        Self::Transport {
            worker,
            reason: reason.into(),
        }
    }

    /// Create a resource exhausted error
    pub fn resource_exhausted(resource: impl Into<String>, limit: impl Into<String>) -> Self {
        Self::ResourceExhausted {
            resource: resource.into(),
            limit: limit.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = RuntimeError::invalid_config("no nodes");
        assert!(matches!(err, RuntimeError::InvalidConfiguration { .. }));

        let err = RuntimeError::invalid_parameter("tick_bound", "0", ">= 1");
        assert!(matches!(err, RuntimeError::InvalidParameter { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = RuntimeError::transport(3, "peer hung up");
        let msg = format!("{}", err);
        assert!(msg.contains("worker 3"));
        assert!(msg.contains("peer hung up"));
    }

    #[test]
    fn test_graph_error_conversion() {
        let err: RuntimeError = nsim_graph::GraphError::EmptyGraph.into();
        assert!(matches!(err, RuntimeError::Graph { .. }));
    }
}

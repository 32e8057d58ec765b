//! Error handling for the nsim CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Graph loading error
    #[error("Graph error: {0}")]
    Graph(#[from] nsim_graph::GraphError),

    /// Runtime layer error
    #[error("Runtime error: {0}")]
    Runtime(#[from] nsim_runtime::RuntimeError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file syntax error
    #[error("Serialization error: {0}")]
    Serde(#[from] toml::de::Error),

    /// Generic error
    #[error("Error: {0}")]
    Generic(#[from] anyhow::Error),

    /// Invalid command arguments
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArgs(msg.into())
    }
}

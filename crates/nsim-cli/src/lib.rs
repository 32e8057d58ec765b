//! nsim CLI crate
//!
//! Wraps the runtime in a single command, `nsim <graph_file> <tick_count>`:
//! load the graph, run it across worker threads, write the summary report
//! and print the completion lines. Flags can be given defaults through a
//! TOML file passed with `--config`.
//!
//! The binary (src/main.rs) only sets up logging and argument parsing;
//! everything else is reachable from here for integration tests.

pub mod commands;
pub mod config;
pub mod error;

pub use commands::NsimCli;

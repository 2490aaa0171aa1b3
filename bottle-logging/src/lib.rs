//! Logging infrastructure for the bottle load generator
//!
//! Logs are written to stderr through `tracing`; stdout carries the run report.

pub mod init;

pub use init::{init_logging_from_config, init_simple_tracing};

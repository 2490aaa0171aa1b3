//! Run-level error types

use bottle_config::ConfigError;
use bottle_http::HttpError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a run before or instead of reporting
#[derive(Debug, Error)]
pub enum LoadTestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Corpus unavailable at {}: {reason}", .path.display())]
    CorpusUnavailable { path: PathBuf, reason: String },

    #[error("Warmup shortfall: {succeeded} successful requests, {required} required")]
    WarmupShortfall { succeeded: usize, required: usize },

    #[error("HTTP client setup failed: {0}")]
    Http(#[from] HttpError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl LoadTestError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadTestError::Config(_)
            | LoadTestError::WarmupShortfall { .. }
            | LoadTestError::Http(_) => 1,
            LoadTestError::CorpusUnavailable { .. }
            | LoadTestError::Io(_)
            | LoadTestError::Csv(_) => 2,
        }
    }
}

pub type LoadTestResult<T> = Result<T, LoadTestError>;

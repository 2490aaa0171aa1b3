//! CLI argument parsing definitions

use bottle_config::{BottleConfig, ConfigResult, RunConfig, DEFAULT_EXECUTOR_TIMEOUT_MIN};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "loadtest", author, version, about, long_about = None)]
pub struct Cli {
    /// Workers released per thread group
    #[arg(value_name = "threadGroupSize")]
    pub thread_group_size: usize,

    /// Number of thread groups in the main phase
    #[arg(value_name = "numThreadGroups")]
    pub num_thread_groups: usize,

    /// Seconds between thread group releases
    #[arg(value_name = "delaySeconds")]
    pub delay_seconds: u64,

    /// Base URL of the service under test
    #[arg(value_name = "baseUrl")]
    pub base_url: String,

    /// Legacy positional form of --useCircuitBreaker
    #[arg(value_name = "useCircuitBreaker", hide = true, conflicts_with = "use_circuit_breaker")]
    pub use_circuit_breaker_pos: Option<bool>,

    /// Legacy positional form of --executorTimeoutMin
    #[arg(value_name = "executorTimeoutMin", hide = true, conflicts_with = "executor_timeout_min")]
    pub executor_timeout_pos: Option<u64>,

    /// Gate requests with the latency circuit breaker
    #[arg(
        long = "useCircuitBreaker",
        alias = "use-circuit-breaker",
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        require_equals = true
    )]
    pub use_circuit_breaker: Option<bool>,

    /// Global deadline for the main phase, in minutes
    #[arg(
        long = "executorTimeoutMin",
        alias = "executor-timeout-min",
        value_name = "MINUTES"
    )]
    pub executor_timeout_min: Option<u64>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Seed corpus file (overrides corpus.path)
    #[arg(long, value_name = "PATH")]
    pub corpus: Option<PathBuf>,

    /// Directory for the CSV reports (overrides report.results_dir)
    #[arg(long, value_name = "PATH")]
    pub results_dir: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Cli {
    /// Frozen run parameters from the positional arguments and flags
    pub fn run_config(&self) -> ConfigResult<RunConfig> {
        RunConfig::new(
            self.thread_group_size,
            self.num_thread_groups,
            self.delay_seconds,
            self.base_url.as_str(),
            self.use_circuit_breaker
                .or(self.use_circuit_breaker_pos)
                .unwrap_or(false),
            self.executor_timeout_min
                .or(self.executor_timeout_pos)
                .unwrap_or(DEFAULT_EXECUTOR_TIMEOUT_MIN),
        )
    }

    /// Apply path flags on top of the loaded tunables
    pub fn apply_overrides(&self, config: &mut BottleConfig) {
        if let Some(corpus) = &self.corpus {
            config.corpus.path = corpus.clone();
        }
        if let Some(dir) = &self.results_dir {
            config.report.results_dir = dir.clone();
        }
    }
}

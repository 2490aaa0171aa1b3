//! Domain-driven configuration for the bottle load generator
//!
//! Run parameters come from the command line ([`RunConfig`]); tunables are
//! split by functional domain ([`BottleConfig`]) and may be loaded from a
//! YAML file with `BOTTLE_*` environment overrides.

pub mod domains;
pub mod error;
pub mod loader;
pub mod run;
pub mod validation;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use run::{RunConfig, DEFAULT_EXECUTOR_TIMEOUT_MIN};
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    breaker::BreakerConfig,
    corpus::CorpusConfig,
    http::HttpConfig,
    logging::{LogLevel, LoggingConfig},
    report::ReportConfig,
    workload::WorkloadConfig,
    BottleConfig,
};

//! Workload driver for the bottle load generator
//!
//! A run loads the seed corpus, verifies the system under test with a fixed
//! warmup phase, releases cohorts of workers on a wall-clock schedule, and
//! reports latency and throughput from the captured records.

pub mod corpus;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod request;
pub mod scheduler;
pub mod sink;

pub use corpus::Corpus;
pub use error::{LoadTestError, LoadTestResult};
pub use orchestrator::{LoadTest, RunSummary};
pub use report::{CsvPaths, LatencyStats, Report};
pub use request::{RequestBuilder, Theme};
pub use scheduler::{PhasePlan, PhaseSummary, Scheduler};
pub use sink::{FrozenResults, ResultSink};

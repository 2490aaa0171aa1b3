//! Resilience patterns for the bottle load generator
//!
//! This crate provides the client-side latency circuit breaker that gates
//! request issuance, and the shutdown coordinator used to drain workers when
//! the run deadline expires.

pub mod circuit_breaker;
pub mod shutdown;

// Re-export commonly used types
pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerBuilder, CircuitBreakerConfig, CircuitMetrics, CircuitState,
    DisabledBreaker, GateDecision, IssueGate,
};
pub use shutdown::{ShutdownCoordinator, ShutdownError, TaskGuard};

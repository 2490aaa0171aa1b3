//! Latency circuit breaker
//!
//! The breaker regulates load rather than errors: it only observes successful
//! responses and counts those slower than `latency_threshold`. Transport
//! failures and non-2xx statuses never reach it.
//!
//! ```text
//! CLOSED   --slow, count >= max_failures-->  OPEN
//! OPEN     --gate after cooldown------------> HALF_OPEN
//! HALF_OPEN --fast success-----------------> CLOSED
//! HALF_OPEN --slow, count >= max_failures--> OPEN
//! ```

use bottle_config::BreakerConfig;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Circuit is closed, requests pass through normally
    Closed,
    /// Circuit is open, requests are dropped until the cooldown elapses
    Open,
    /// Circuit is half-open, the next fast success closes it
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Result of the pre-issuance check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    /// Drop this request slot; it is neither retried nor counted as a failure
    Skip,
}

/// Gate consulted by every issuer before and after a request.
pub trait IssueGate: Send + Sync {
    /// Decide whether the next request may be issued
    fn pre_issue_gate(&self) -> GateDecision;

    /// Report a successful completion and its measured latency
    fn on_success(&self, latency: Duration);

    /// Current state, possibly stale by one transition
    fn state(&self) -> CircuitState;
}

/// Circuit breaker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Number of slow successes before opening the circuit
    pub max_failures: u32,

    /// Latency above which a success counts as a failure
    pub latency_threshold: Duration,

    /// Time after the last slow success during which requests are dropped
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self::from(&BreakerConfig::default())
    }
}

impl From<&BreakerConfig> for CircuitBreakerConfig {
    fn from(config: &BreakerConfig) -> Self {
        Self {
            max_failures: config.max_failures,
            latency_threshold: config.latency_threshold,
            cooldown: config.cooldown,
        }
    }
}

/// Circuit breaker metrics
#[derive(Debug, Clone, Default)]
pub struct CircuitMetrics {
    /// Successes observed by the breaker
    pub total_successes: u64,
    /// Successes slower than the latency threshold
    pub slow_successes: u64,
    /// Requests dropped while the circuit was open
    pub total_skipped: u64,
    /// CLOSED/HALF_OPEN -> OPEN transitions
    pub trips: u64,
    /// HALF_OPEN -> CLOSED transitions
    pub recoveries: u64,
    /// Current count of slow successes since the last fast one
    pub failure_count: u32,
    /// Last slow success
    pub last_failure_time: Option<Instant>,
    /// Last state change time
    pub last_state_change: Option<Instant>,
}

/// Thread-safe latency circuit breaker; clones share state.
#[derive(Clone)]
pub struct CircuitBreaker {
    config: Arc<CircuitBreakerConfig>,
    state: Arc<Mutex<CircuitBreakerState>>,
}

struct CircuitBreakerState {
    state: CircuitState,
    metrics: CircuitMetrics,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given configuration
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::new(Mutex::new(CircuitBreakerState {
                state: CircuitState::Closed,
                metrics: CircuitMetrics::default(),
            })),
        }
    }

    /// Get current metrics
    pub fn metrics(&self) -> CircuitMetrics {
        self.state.lock().metrics.clone()
    }

    fn transition_to_open(&self, state: &mut CircuitBreakerState) {
        state.state = CircuitState::Open;
        state.metrics.trips += 1;
        state.metrics.last_state_change = Some(Instant::now());
        tracing::warn!(
            failure_count = state.metrics.failure_count,
            "Circuit breaker tripped! Pausing requests."
        );
    }

    fn transition_to_closed(&self, state: &mut CircuitBreakerState) {
        state.state = CircuitState::Closed;
        state.metrics.failure_count = 0;
        state.metrics.recoveries += 1;
        state.metrics.last_state_change = Some(Instant::now());
        tracing::info!("Circuit breaker recovered!");
    }

    fn transition_to_half_open(&self, state: &mut CircuitBreakerState) {
        state.state = CircuitState::HalfOpen;
        state.metrics.last_state_change = Some(Instant::now());
        tracing::info!("Circuit breaker cooldown elapsed, probing in half-open state");
    }

    fn cooling_down(&self, state: &CircuitBreakerState) -> bool {
        match state.metrics.last_failure_time {
            Some(last_failure) => last_failure.elapsed() <= self.config.cooldown,
            None => false,
        }
    }
}

impl IssueGate for CircuitBreaker {
    fn pre_issue_gate(&self) -> GateDecision {
        let mut state = self.state.lock();
        if state.state != CircuitState::Open {
            return GateDecision::Proceed;
        }

        if self.cooling_down(&state) {
            state.metrics.total_skipped += 1;
            GateDecision::Skip
        } else {
            self.transition_to_half_open(&mut state);
            GateDecision::Proceed
        }
    }

    fn on_success(&self, latency: Duration) {
        let mut state = self.state.lock();
        state.metrics.total_successes += 1;

        if latency > self.config.latency_threshold {
            state.metrics.slow_successes += 1;
            state.metrics.failure_count = state.metrics.failure_count.saturating_add(1);
            state.metrics.last_failure_time = Some(Instant::now());

            // A slow straggler landing while OPEN only extends the cooldown
            if state.metrics.failure_count >= self.config.max_failures
                && state.state != CircuitState::Open
            {
                self.transition_to_open(&mut state);
            }
        } else {
            state.metrics.failure_count = 0;
            if state.state == CircuitState::HalfOpen {
                self.transition_to_closed(&mut state);
            }
        }
    }

    fn state(&self) -> CircuitState {
        self.state.lock().state
    }
}

/// Breaker used when circuit breaking is turned off: always closed, never gates.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledBreaker;

impl IssueGate for DisabledBreaker {
    fn pre_issue_gate(&self) -> GateDecision {
        GateDecision::Proceed
    }

    fn on_success(&self, _latency: Duration) {}

    fn state(&self) -> CircuitState {
        CircuitState::Closed
    }
}

/// Builder for circuit breaker configuration
pub struct CircuitBreakerBuilder {
    config: CircuitBreakerConfig,
}

impl CircuitBreakerBuilder {
    /// Create a new builder with default config
    pub fn new() -> Self {
        Self {
            config: CircuitBreakerConfig::default(),
        }
    }

    /// Set the number of slow successes that opens the circuit
    pub fn max_failures(mut self, max_failures: u32) -> Self {
        self.config.max_failures = max_failures;
        self
    }

    /// Set the latency threshold
    pub fn latency_threshold(mut self, threshold: Duration) -> Self {
        self.config.latency_threshold = threshold;
        self
    }

    /// Set the cooldown before the circuit half-opens
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.config.cooldown = cooldown;
        self
    }

    /// Build the circuit breaker
    pub fn build(self) -> CircuitBreaker {
        CircuitBreaker::new(self.config)
    }
}

impl Default for CircuitBreakerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const FAST: Duration = Duration::from_millis(10);
    const SLOW: Duration = Duration::from_millis(200);

    fn breaker(max_failures: u32, cooldown: Duration) -> CircuitBreaker {
        CircuitBreakerBuilder::new()
            .max_failures(max_failures)
            .latency_threshold(Duration::from_millis(100))
            .cooldown(cooldown)
            .build()
    }

    #[test]
    fn test_slow_successes_trip_then_recover() {
        let breaker = breaker(3, Duration::from_millis(100));

        breaker.on_success(SLOW);
        assert_eq!(breaker.state(), CircuitState::Closed);
        breaker.on_success(SLOW);
        assert_eq!(breaker.state(), CircuitState::Closed);
        breaker.on_success(SLOW);
        assert_eq!(breaker.state(), CircuitState::Open);

        // Inside the cooldown every slot is dropped
        assert_eq!(breaker.pre_issue_gate(), GateDecision::Skip);
        assert_eq!(breaker.pre_issue_gate(), GateDecision::Skip);

        thread::sleep(Duration::from_millis(150));
        assert_eq!(breaker.pre_issue_gate(), GateDecision::Proceed);
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        breaker.on_success(FAST);
        assert_eq!(breaker.state(), CircuitState::Closed);

        let metrics = breaker.metrics();
        assert_eq!(metrics.trips, 1);
        assert_eq!(metrics.recoveries, 1);
        assert_eq!(metrics.total_skipped, 2);
        assert_eq!(metrics.failure_count, 0);
    }

    #[test]
    fn test_fast_success_resets_count() {
        let breaker = breaker(3, Duration::from_secs(5));

        breaker.on_success(SLOW);
        breaker.on_success(SLOW);
        breaker.on_success(FAST);
        breaker.on_success(SLOW);
        breaker.on_success(SLOW);
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.metrics().failure_count, 2);

        // Exactly at the threshold is not slow
        breaker.on_success(Duration::from_millis(100));
        assert_eq!(breaker.metrics().failure_count, 0);
    }

    #[test]
    fn test_single_slow_success_gates_next_request() {
        let breaker = breaker(1, Duration::from_secs(5));

        assert_eq!(breaker.pre_issue_gate(), GateDecision::Proceed);
        breaker.on_success(SLOW);
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.pre_issue_gate(), GateDecision::Skip);
    }

    #[test]
    fn test_half_open_slow_success_reopens() {
        let breaker = breaker(2, Duration::from_millis(50));

        breaker.on_success(SLOW);
        breaker.on_success(SLOW);
        assert_eq!(breaker.state(), CircuitState::Open);

        thread::sleep(Duration::from_millis(80));
        assert_eq!(breaker.pre_issue_gate(), GateDecision::Proceed);
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        breaker.on_success(SLOW);
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.metrics().trips, 2);
    }

    #[test]
    fn test_stragglers_while_open_do_not_change_state() {
        let breaker = breaker(1, Duration::from_millis(200));

        breaker.on_success(SLOW);
        assert_eq!(breaker.state(), CircuitState::Open);

        // A fast in-flight response must not close an OPEN circuit
        breaker.on_success(FAST);
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.metrics().trips, 1);

        // A slow one extends the cooldown without re-tripping
        thread::sleep(Duration::from_millis(120));
        breaker.on_success(SLOW);
        assert_eq!(breaker.metrics().trips, 1);
        thread::sleep(Duration::from_millis(120));
        assert_eq!(breaker.pre_issue_gate(), GateDecision::Skip);
    }

    #[test]
    fn test_concurrent_observers_see_valid_states() {
        let breaker = breaker(5, Duration::from_millis(1));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let breaker = breaker.clone();
                thread::spawn(move || {
                    for n in 0..500 {
                        if breaker.pre_issue_gate() == GateDecision::Proceed {
                            let slow = (n + i) % 3 == 0;
                            breaker.on_success(if slow { SLOW } else { FAST });
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let metrics = breaker.metrics();
        // Every recovery needs a preceding trip
        assert!(metrics.recoveries <= metrics.trips);
    }

    #[test]
    fn test_disabled_breaker_never_gates() {
        let breaker = DisabledBreaker;
        for _ in 0..100 {
            breaker.on_success(Duration::from_secs(60));
            assert_eq!(breaker.pre_issue_gate(), GateDecision::Proceed);
        }
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_config_from_domain() {
        let config = CircuitBreakerConfig::from(&BreakerConfig::default());
        assert_eq!(config.max_failures, 20);
        assert_eq!(config.latency_threshold, Duration::from_millis(5000));
        assert_eq!(config.cooldown, Duration::from_millis(5000));
    }
}

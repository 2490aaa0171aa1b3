//! Phased workload scheduling
//!
//! A phase releases `cohorts` groups of `cohort_size` workers, cohort `i` at
//! `i * delay` after the phase starts. Releases are driven by the clock alone,
//! never by earlier cohorts finishing. Each worker runs `iterations` rounds of
//! one POST followed by one GET.

use crate::request::RequestBuilder;
use crate::sink::ResultSink;
use bottle_config::{RunConfig, WorkloadConfig};
use bottle_http::HttpIssuer;
use bottle_resilience::{ShutdownCoordinator, TaskGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

/// Shape of one phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhasePlan {
    pub name: &'static str,
    pub cohorts: usize,
    pub cohort_size: usize,
    /// POST+GET rounds per worker
    pub iterations: usize,
    pub delay: Duration,
    /// Global deadline measured from the phase start
    pub deadline: Option<Duration>,
}

impl PhasePlan {
    /// Fixed-width liveness check run before the main phase
    pub fn warmup(workload: &WorkloadConfig) -> Self {
        Self {
            name: "warmup",
            cohorts: 1,
            cohort_size: workload.warmup_threads,
            iterations: workload.warmup_requests_per_thread,
            delay: Duration::ZERO,
            deadline: None,
        }
    }

    pub fn main(run: &RunConfig, workload: &WorkloadConfig) -> Self {
        Self {
            name: "main",
            cohorts: run.num_thread_groups,
            cohort_size: run.thread_group_size,
            iterations: workload.requests_per_thread,
            delay: run.delay,
            deadline: Some(run.executor_timeout),
        }
    }

    pub fn total_workers(&self) -> usize {
        self.cohorts.saturating_mul(self.cohort_size)
    }

    /// Upper bound on requests the phase can issue
    pub fn max_requests(&self) -> usize {
        self.total_workers()
            .saturating_mul(self.iterations)
            .saturating_mul(2)
    }

    /// Offset of cohort `index` from the phase start
    fn release_offset(&self, index: usize) -> Option<Duration> {
        self.delay.checked_mul(u32::try_from(index).ok()?)
    }
}

/// What happened during a phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseSummary {
    pub name: &'static str,
    pub cohorts_released: usize,
    pub workers_started: usize,
    /// Wall-clock bounds, milliseconds since the Unix epoch
    pub start_ms: i64,
    pub end_ms: i64,
    pub elapsed: Duration,
    pub timed_out: bool,
}

/// Releases worker cohorts and waits for them under the phase deadline
#[derive(Debug, Clone)]
pub struct Scheduler {
    issuer: HttpIssuer,
    builder: RequestBuilder,
    drain_timeout: Duration,
    next_author: Arc<AtomicU64>,
}

impl Scheduler {
    pub fn new(issuer: HttpIssuer, builder: RequestBuilder, drain_timeout: Duration) -> Self {
        Self {
            issuer,
            builder,
            drain_timeout,
            next_author: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Run one phase to completion or to its deadline
    ///
    /// On deadline expiry workers are told to stop at their next request
    /// boundary and get `drain_timeout` past the deadline to finish in-flight
    /// calls; whatever remains is aborted. Records captured so far stay in
    /// `sink`.
    pub async fn run_phase(&self, plan: &PhasePlan, sink: Arc<ResultSink>) -> PhaseSummary {
        let coordinator = Arc::new(ShutdownCoordinator::new(self.drain_timeout));
        let start_ms = chrono::Utc::now().timestamp_millis();
        let phase_start = Instant::now();
        let deadline = plan.deadline.and_then(|d| phase_start.checked_add(d));

        info!(
            "Starting {} phase: {} cohorts of {} workers, {} iterations each",
            plan.name, plan.cohorts, plan.cohort_size, plan.iterations
        );

        let mut workers = JoinSet::new();
        let mut released = 0usize;
        let mut timed_out = false;

        loop {
            let next_release = if released < plan.cohorts {
                plan.release_offset(released)
                    .and_then(|offset| phase_start.checked_add(offset))
            } else {
                None
            };
            if next_release.is_none() && workers.is_empty() {
                break;
            }

            tokio::select! {
                _ = sleep_until_opt(deadline) => {
                    timed_out = true;
                    break;
                }
                _ = sleep_until_opt(next_release) => {
                    debug!("Releasing {} cohort {}", plan.name, released);
                    for _ in 0..plan.cohort_size {
                        let worker = Worker {
                            issuer: self.issuer.clone(),
                            builder: self.builder.clone(),
                            sink: Arc::clone(&sink),
                            coordinator: Arc::clone(&coordinator),
                            author: self.next_author.fetch_add(1, Ordering::Relaxed),
                            iterations: plan.iterations,
                        };
                        let guard = coordinator.task_guard();
                        workers.spawn(worker.run(guard));
                    }
                    released += 1;
                }
                Some(joined) = workers.join_next(), if !workers.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            error!("{} worker panicked: {}", plan.name, e);
                        }
                    }
                }
            }
        }

        if timed_out {
            warn!(
                "{} phase did not finish within {:?}; reporting partial results",
                plan.name,
                plan.deadline.unwrap_or_default()
            );
            if let Err(e) = coordinator.shutdown().await {
                warn!("{}", e);
            }
            workers.shutdown().await;
        }

        let summary = PhaseSummary {
            name: plan.name,
            cohorts_released: released,
            workers_started: released.saturating_mul(plan.cohort_size),
            start_ms,
            end_ms: chrono::Utc::now().timestamp_millis(),
            elapsed: phase_start.elapsed(),
            timed_out,
        };
        info!(
            "{} phase finished in {:.1}s: {} successful, {} failed, {} skipped",
            plan.name,
            summary.elapsed.as_secs_f64(),
            sink.success_count(),
            sink.failure_count(),
            sink.skipped_count()
        );
        summary
    }
}

struct Worker {
    issuer: HttpIssuer,
    builder: RequestBuilder,
    sink: Arc<ResultSink>,
    coordinator: Arc<ShutdownCoordinator>,
    author: u64,
    iterations: usize,
}

impl Worker {
    async fn run(self, _guard: TaskGuard) {
        for _ in 0..self.iterations {
            if self.coordinator.is_shutting_down() {
                break;
            }
            let post = self.builder.build_post(self.author);
            self.issuer.issue(&post, self.sink.as_ref()).await;

            if self.coordinator.is_shutting_down() {
                break;
            }
            let get = self.builder.build_get();
            self.issuer.issue(&get, self.sink.as_ref()).await;
        }
    }
}

async fn sleep_until_opt(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

//! Shutdown coordination
//!
//! Workers hold a [`TaskGuard`] while running and poll
//! [`ShutdownCoordinator::is_shutting_down`] between requests. When the run
//! deadline passes the coordinator raises the flag and gives in-flight requests
//! a bounded drain window.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Shutdown coordinator shared by the scheduler and its workers
#[derive(Debug)]
pub struct ShutdownCoordinator {
    is_shutting_down: AtomicBool,
    active_tasks: Arc<AtomicU32>,
    drain_timeout: Duration,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator with the given drain window
    pub fn new(drain_timeout: Duration) -> Self {
        Self {
            is_shutting_down: AtomicBool::new(false),
            active_tasks: Arc::new(AtomicU32::new(0)),
            drain_timeout,
        }
    }

    /// Check if shutdown is in progress
    pub fn is_shutting_down(&self) -> bool {
        self.is_shutting_down.load(Ordering::Acquire)
    }

    /// Register a running task; the count drops when the guard does
    pub fn task_guard(&self) -> TaskGuard {
        self.active_tasks.fetch_add(1, Ordering::AcqRel);
        TaskGuard {
            active_tasks: Arc::clone(&self.active_tasks),
        }
    }

    /// Get current active task count
    pub fn active_task_count(&self) -> u32 {
        self.active_tasks.load(Ordering::Acquire)
    }

    /// Raise the shutdown flag and wait up to the drain window for tasks to finish
    pub async fn shutdown(&self) -> Result<(), ShutdownError> {
        if self.is_shutting_down.swap(true, Ordering::AcqRel) {
            return Err(ShutdownError::AlreadyShuttingDown);
        }

        info!(
            active = self.active_task_count(),
            "Shutting down, draining in-flight requests"
        );

        if self.wait_for_tasks(self.drain_timeout).await {
            info!("All workers drained");
            return Ok(());
        }

        let remaining = self.active_task_count();
        warn!(
            "Drain window of {:?} elapsed with {} workers still active",
            self.drain_timeout, remaining
        );
        Err(ShutdownError::TasksRemaining(remaining))
    }

    /// Wait for all tasks to complete within the given timeout
    async fn wait_for_tasks(&self, timeout_duration: Duration) -> bool {
        let start = tokio::time::Instant::now();

        loop {
            let active = self.active_task_count();
            if active == 0 {
                return true;
            }
            if start.elapsed() >= timeout_duration {
                return false;
            }

            // Adaptive sleep based on task count
            let sleep_duration = if active > 10 {
                Duration::from_millis(100)
            } else {
                Duration::from_millis(20)
            };

            tokio::time::sleep(sleep_duration).await;
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

/// Marks a task as active for as long as it lives
#[derive(Debug)]
pub struct TaskGuard {
    active_tasks: Arc<AtomicU32>,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.active_tasks.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Shutdown error types
#[derive(Debug, thiserror::Error)]
pub enum ShutdownError {
    /// Shutdown already in progress
    #[error("Shutdown already in progress")]
    AlreadyShuttingDown,

    /// Tasks remaining after the drain window
    #[error("Drain completed with {0} tasks still active")]
    TasksRemaining(u32),
}

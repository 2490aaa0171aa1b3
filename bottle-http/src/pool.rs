//! Bounded connection pool
//!
//! reqwest keeps idle connections but does not cap in-flight ones, so the
//! issuer takes a lease before every request: one permit from the route's
//! semaphore and one from the global semaphore. Issuers block here when the
//! pool is exhausted; fairness is whatever tokio's semaphore provides.

use crate::errors::HttpError;
use parking_lot::Mutex;
use reqwest::Url;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Shared connection budget; clones share the same permits
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    total: Arc<Semaphore>,
    routes: Arc<Mutex<HashMap<String, Arc<Semaphore>>>>,
    max_total: usize,
    max_per_route: usize,
}

/// Permission to hold one connection; released on drop
#[derive(Debug)]
pub struct PoolLease {
    _route: OwnedSemaphorePermit,
    _total: OwnedSemaphorePermit,
}

impl ConnectionPool {
    pub fn new(max_total: usize, max_per_route: usize) -> Self {
        Self {
            total: Arc::new(Semaphore::new(max_total)),
            routes: Arc::new(Mutex::new(HashMap::new())),
            max_total,
            max_per_route: max_per_route.min(max_total),
        }
    }

    /// Route key: scheme, host and port
    pub fn route_key(url: &Url) -> Result<String, HttpError> {
        let host = url
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl(format!("{} has no host", url)))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| HttpError::InvalidUrl(format!("{} has no port", url)))?;
        Ok(format!("{}://{}:{}", url.scheme(), host, port))
    }

    /// Wait for a free connection slot towards `url`
    pub async fn acquire(&self, url: &Url) -> Result<PoolLease, HttpError> {
        let route = self.route_semaphore(&Self::route_key(url)?);

        // Route first so a saturated host does not hold global permits while waiting
        let route_permit = route
            .acquire_owned()
            .await
            .map_err(|_| HttpError::PoolClosed)?;
        let total_permit = Arc::clone(&self.total)
            .acquire_owned()
            .await
            .map_err(|_| HttpError::PoolClosed)?;

        Ok(PoolLease {
            _route: route_permit,
            _total: total_permit,
        })
    }

    pub fn max_total(&self) -> usize {
        self.max_total
    }

    pub fn max_per_route(&self) -> usize {
        self.max_per_route
    }

    /// Free slots across all routes
    pub fn available_total(&self) -> usize {
        self.total.available_permits()
    }

    /// Free slots for one route
    pub fn available_for(&self, url: &Url) -> Result<usize, HttpError> {
        let key = Self::route_key(url)?;
        Ok(self
            .routes
            .lock()
            .get(&key)
            .map(|s| s.available_permits())
            .unwrap_or(self.max_per_route))
    }

    fn route_semaphore(&self, key: &str) -> Arc<Semaphore> {
        let mut routes = self.routes.lock();
        Arc::clone(
            routes
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Semaphore::new(self.max_per_route))),
        )
    }
}

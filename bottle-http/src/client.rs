//! HTTP issuer implementation

use crate::config::IssuerConfig;
use crate::errors::HttpError;
use crate::pool::ConnectionPool;
use crate::types::{FailureKind, HttpRequest, Outcome, RequestKind, RequestRecord};
use bottle_resilience::{GateDecision, IssueGate};
use chrono::Utc;
use reqwest::{header::CONTENT_TYPE, Client, Url};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Destination for everything an issuer observes
pub trait RecordSink: Send + Sync {
    /// A 2xx response; `record` carries the start time and latency
    fn record_success(&self, record: RequestRecord);

    /// A non-2xx response or a transport error
    fn record_failure(&self, kind: RequestKind, failure: &FailureKind);

    /// A request slot dropped by the breaker
    fn record_skip(&self, kind: RequestKind);
}

/// Issues requests through the shared client and bounded pool
///
/// Cheap to clone; all clones share the client, the pool and the gate.
#[derive(Clone)]
pub struct HttpIssuer {
    client: Client,
    pool: ConnectionPool,
    gate: Arc<dyn IssueGate>,
    max_attempts: u32,
}

struct Attempt {
    start_ms: i64,
    latency: Duration,
    status: u16,
}

impl HttpIssuer {
    /// Build the shared client and pool
    pub fn new(config: &IssuerConfig, gate: Arc<dyn IssueGate>) -> Result<Self, HttpError> {
        if config.max_total_connections == 0 || config.max_per_route == 0 {
            return Err(HttpError::ConfigError(
                "connection limits must be positive".to_string(),
            ));
        }

        debug!(
            "Creating HTTP issuer: {} total connections, {} per route, {}s timeout",
            config.max_total_connections,
            config.max_per_route,
            config.request_timeout.as_secs()
        );

        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .pool_max_idle_per_host(config.max_per_route)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            pool: ConnectionPool::new(config.max_total_connections, config.max_per_route),
            gate,
            max_attempts: config.max_attempts.max(1),
        })
    }

    /// Issue one request and record what happened
    ///
    /// Never returns an error: every failure is folded into the [`Outcome`]
    /// and reported to `sink`. Only successes reach the gate.
    pub async fn issue(&self, request: &HttpRequest, sink: &dyn RecordSink) -> Outcome {
        if self.gate.pre_issue_gate() == GateDecision::Skip {
            sink.record_skip(request.kind);
            return Outcome::Skipped;
        }

        let url = match Url::parse(&request.url) {
            Ok(url) => url,
            Err(e) => {
                let failure =
                    FailureKind::Transport(format!("invalid URL {}: {}", request.url, e));
                warn!("{} {} failed: {}", request.kind, request.url, failure);
                sink.record_failure(request.kind, &failure);
                return Outcome::Failure(failure);
            }
        };

        let mut last_failure = FailureKind::Transport("no attempt made".to_string());
        for attempt in 1..=self.max_attempts {
            match self.attempt(request, &url).await {
                Ok(done) if (200..300).contains(&done.status) => {
                    sink.record_success(RequestRecord {
                        start_ms: done.start_ms,
                        kind: request.kind,
                        latency_ms: i64::try_from(done.latency.as_millis()).unwrap_or(i64::MAX),
                        status: done.status,
                    });
                    self.gate.on_success(done.latency);
                    return Outcome::Success {
                        latency: done.latency,
                        status: done.status,
                    };
                }
                Ok(done) => {
                    debug!(
                        "{} {} returned {} (attempt {}/{})",
                        request.kind, url, done.status, attempt, self.max_attempts
                    );
                    last_failure = FailureKind::Status(done.status);
                }
                Err(e) => {
                    warn!(
                        "{} {} failed (attempt {}/{}): {}",
                        request.kind, url, attempt, self.max_attempts, e
                    );
                    last_failure = FailureKind::Transport(e.to_string());
                }
            }
            sink.record_failure(request.kind, &last_failure);
        }

        Outcome::Failure(last_failure)
    }

    async fn attempt(&self, request: &HttpRequest, url: &Url) -> Result<Attempt, HttpError> {
        let _lease = self.pool.acquire(url).await?;

        let mut builder = self
            .client
            .request(reqwest::Method::from(request.kind), url.clone());
        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone());
        }

        let start_ms = Utc::now().timestamp_millis();
        let started = Instant::now();
        let response = builder.send().await?;
        let latency = started.elapsed();
        let status = response.status().as_u16();

        // Drain so the connection can go back to the idle pool
        if let Err(e) = response.bytes().await {
            debug!("Failed to drain response body from {}: {}", url, e);
        }

        Ok(Attempt {
            start_ms,
            latency,
            status,
        })
    }
}

impl std::fmt::Debug for HttpIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpIssuer")
            .field("pool", &self.pool)
            .field("gate_state", &self.gate.state())
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

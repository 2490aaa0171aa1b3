//! Request, record and outcome types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// The two request shapes sent to the system under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestKind {
    Post,
    Get,
}

impl RequestKind {
    /// Get the string representation of the HTTP method
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Post => "POST",
            RequestKind::Get => "GET",
        }
    }

    pub fn all() -> &'static [RequestKind] {
        &[RequestKind::Post, RequestKind::Get]
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequestKind {
    type Err = RequestKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "POST" => Ok(RequestKind::Post),
            "GET" => Ok(RequestKind::Get),
            _ => Err(RequestKindError::InvalidKind(s.to_string())),
        }
    }
}

impl From<RequestKind> for reqwest::Method {
    fn from(kind: RequestKind) -> Self {
        match kind {
            RequestKind::Post => reqwest::Method::POST,
            RequestKind::Get => reqwest::Method::GET,
        }
    }
}

/// Error type for request kind parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestKindError {
    #[error("Invalid request kind: {0}")]
    InvalidKind(String),
}

/// A fully built request, ready to issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub kind: RequestKind,
    pub url: String,
    /// JSON body, sent with `Content-Type: application/json`
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            kind: RequestKind::Get,
            url: url.into(),
            body: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: RequestKind::Post,
            url: url.into(),
            body: Some(body.into()),
        }
    }
}

/// One successful response, as captured by the issuer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// Wall-clock start, milliseconds since the Unix epoch
    pub start_ms: i64,
    pub kind: RequestKind,
    pub latency_ms: i64,
    pub status: u16,
}

/// Why a request produced no record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// No response was received
    Transport(String),
    /// A response arrived with a status outside [200, 300)
    Status(u16),
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Transport(reason) => write!(f, "transport error: {}", reason),
            FailureKind::Status(status) => write!(f, "unexpected status {}", status),
        }
    }
}

/// Result of a single `issue` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { latency: Duration, status: u16 },
    Failure(FailureKind),
    /// Dropped by an open circuit breaker before any I/O
    Skipped,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

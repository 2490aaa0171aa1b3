//! HTTP request issuance for the bottle load generator
//!
//! This crate owns the shared reqwest client, the bounded connection pool,
//! and the issuer that turns one request into exactly one [`Outcome`].

pub mod client;
pub mod config;
pub mod errors;
pub mod pool;
pub mod types;

// Re-export main types for convenience
pub use client::{HttpIssuer, RecordSink};
pub use config::IssuerConfig;
pub use errors::HttpError;
pub use pool::{ConnectionPool, PoolLease};
pub use types::{FailureKind, HttpRequest, Outcome, RequestKind, RequestKindError, RequestRecord};

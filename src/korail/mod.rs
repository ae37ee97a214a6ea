//! Upstream seat-availability source.
//!
//! The session loop only depends on the [`SeatSource`] contract; the
//! shipped implementation ([`client::KorailClient`]) talks to the
//! Korail mobile schedule API. Tests substitute scripted sources.

pub mod client;

use thiserror::Error;

use crate::models::query::{CheckResult, TrainQuery};

pub use client::KorailClient;

/// Why a single availability check failed.
///
/// Every variant is recoverable: the session loop treats them all the
/// same (back off, count the consecutive error) and keeps the
/// classification only for logging.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("upstream rejected the request [{code}]: {message}")]
    Api { code: String, message: String },

    #[error("malformed response: {0}")]
    Parse(String),
}

impl QueryError {
    /// Short classification tag used in log lines.
    pub fn classification(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Timeout(_) => "timeout",
            Self::Api { .. } => "api",
            Self::Parse(_) => "parse",
        }
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// The availability collaborator the session loop polls each tick.
pub trait SeatSource {
    /// Run one availability check for `query`.
    fn check(&mut self, query: &TrainQuery) -> Result<CheckResult, QueryError>;

    /// Release any pooled resources. Invoked exactly once, during the
    /// session's draining step; the default is a no-op for sources
    /// without external state.
    fn close(&mut self) {}
}

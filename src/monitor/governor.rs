//! Session resource governor.
//!
//! A pure predicate over the session's counters, evaluated once per
//! tick before the next check is issued. The governor never acts on
//! its own; it hands the caller a reason code and the session loop
//! performs the terminal transition.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::config::SessionLimits;

/// Why a session ended.
///
/// The first three are resource-limit trips (always fatal, never
/// retried); `Cancelled` is the deliberate external stop, which is not
/// an error either. All four produce a normal `SessionReport`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    /// Wall-clock budget exhausted.
    SessionExpired,
    /// Upstream request budget exhausted.
    RequestLimit,
    /// Too many consecutive failed checks.
    ErrorLimit,
    /// Operator or caller requested a stop.
    Cancelled,
}

impl StopReason {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::SessionExpired => "session duration limit reached",
            Self::RequestLimit => "request limit reached",
            Self::ErrorLimit => "consecutive error limit reached",
            Self::Cancelled => "stopped on request",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Decide whether the session may issue another check.
///
/// Checks run in a fixed order and the first violated limit wins:
/// session duration, then request budget, then consecutive errors.
/// Pure: identical inputs always yield the identical answer.
pub fn check_limits(
    elapsed: Duration,
    request_count: u32,
    consecutive_errors: u32,
    limits: &SessionLimits,
) -> Option<StopReason> {
    if elapsed > limits.max_session_duration() {
        return Some(StopReason::SessionExpired);
    }
    if request_count >= limits.max_requests {
        return Some(StopReason::RequestLimit);
    }
    if consecutive_errors >= limits.max_consecutive_errors {
        return Some(StopReason::ErrorLimit);
    }
    None
}

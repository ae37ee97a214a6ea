//! Adaptive polling interval.
//!
//! Backs off multiplicatively after errors and recovers gradually
//! after successes. Recovery (divide by 1.2) is slower than backoff
//! (multiply by 1.5) so the request rate does not oscillate against
//! the upstream server.

use std::time::Duration;

use rand::Rng;

use crate::models::config::PollingTuning;
use crate::models::constants::RECOVERY_DIVISOR;

/// Advance the interval state after one check and compute the actual
/// sleep for this tick.
///
/// Returns `(new_current, sleep_duration)`. Jitter is applied only to
/// the returned sleep, never folded into `new_current`, so the
/// interval state stays deterministic for a given success/error
/// sequence.
pub fn next_interval(current: f64, had_error: bool, tuning: &PollingTuning) -> (f64, Duration) {
    let new_current = if had_error {
        (current * tuning.backoff_multiplier).min(tuning.max_interval_secs)
    } else {
        (current / RECOVERY_DIVISOR).max(tuning.base_interval_secs)
    };

    let jitter = if tuning.jitter_secs > 0.0 {
        rand::thread_rng().gen_range(0.0..tuning.jitter_secs)
    } else {
        0.0
    };

    (new_current, Duration::from_secs_f64(new_current + jitter))
}

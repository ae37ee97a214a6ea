/// Default interval between availability checks, in seconds.
/// Korail's schedule endpoint is rate-sensitive; anything faster than
/// 30s risks being blocked.
pub const DEFAULT_BASE_INTERVAL_SECS: f64 = 30.0;

/// Ceiling for the adaptive interval after repeated errors, in seconds.
pub const DEFAULT_MAX_INTERVAL_SECS: f64 = 300.0;

/// Multiplier applied to the current interval after a failed check.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 1.5;

/// Divisor applied to the current interval after a successful check.
/// Recovery is deliberately slower than backoff so the request rate
/// does not oscillate against the upstream server.
pub const RECOVERY_DIVISOR: f64 = 1.2;

/// Upper bound of the uniform random jitter added to each sleep, in
/// seconds. Jitter desynchronizes repeated polling; it is never folded
/// back into the interval state.
pub const DEFAULT_JITTER_SECS: f64 = 5.0;

/// Maximum wall-clock lifetime of a session (6 hours), in seconds.
pub const DEFAULT_MAX_SESSION_SECS: u64 = 21_600;

/// Maximum number of upstream requests per session.
pub const DEFAULT_MAX_REQUESTS: u32 = 720;

/// Number of consecutive failed checks that terminates the session.
pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 10;

/// Minimum spacing between two notification dispatches, in seconds.
pub const DEFAULT_NOTIFICATION_COOLDOWN_SECS: u64 = 60;

/// Capacity of the in-session event log. When exceeded, the oldest
/// half is dropped in one batch.
pub const DEFAULT_MAX_LOG_ENTRIES: usize = 100;

/// Seat count reported when the upstream response says seats are
/// available but does not state how many. Downstream code only ever
/// tests `> 0`; the magnitude carries no meaning.
pub const SEAT_COUNT_UNKNOWN: u32 = 99;

/// Maximum number of trains included in a notification payload.
/// Anything beyond this cap is silently truncated.
pub const MAX_REPORTED_TRAINS: usize = 5;

/// Rolling window of response-time samples kept for metrics. When
/// full, the window is halved rather than trimmed one-at-a-time.
pub const RESPONSE_TIME_WINDOW: usize = 100;

/// How far into the future a departure date may lie, in days.
pub const MAX_FUTURE_DAYS: i64 = 90;

/// HTTP tuning for the upstream client and the webhook channel.
pub mod http {
    /// Maximum time to establish a TCP connection, in seconds.
    pub const CONNECT_TIMEOUT_SECS: u64 = 5;

    /// Maximum time for one schedule request, in seconds.
    pub const REQUEST_TIMEOUT_SECS: u64 = 15;

    /// Maximum time for one webhook delivery, in seconds.
    pub const WEBHOOK_TIMEOUT_SECS: u64 = 10;

    /// Pagination guard for the schedule endpoint.
    pub const MAX_SCHEDULE_PAGES: usize = 5;
}

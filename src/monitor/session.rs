//! The monitoring session loop.
//!
//! One session owns one immutable query and drives the tick cycle:
//! governor check, cancellation check, availability poll, state
//! machine update, optional notification dispatch, adaptive sleep.
//! `run` blocks until the session reaches `Stopped` and always returns
//! a `SessionReport`; resource-limit trips and cancellation are
//! normal outcomes here, not errors.

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::korail::SeatSource;
use crate::models::config::MonitorConfig;
use crate::models::constants::MAX_REPORTED_TRAINS;
use crate::models::query::TrainQuery;
use crate::notify::{DispatchOutcome, NotificationEvent, Notifier};

use super::event_log::{EventLog, LogEntry};
use super::governor::{self, StopReason};
use super::metrics::SessionMetrics;
use super::scheduler;
use super::state::{is_valid_transition, MonitorState};

/// Cancellable sleep shared between the session loop and its handles.
///
/// A `Condvar` over a `Mutex<bool>` rather than a bare atomic flag:
/// `stop()` must wake an in-progress sleep immediately, so shutdown
/// latency stays constant instead of growing with the backoff
/// interval. Lock poisoning is treated as a stop request.
#[derive(Clone)]
struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    fn stop(&self) {
        let (flag, cvar) = &*self.inner;
        if let Ok(mut stopped) = flag.lock() {
            *stopped = true;
        }
        cvar.notify_all();
    }

    fn is_stopped(&self) -> bool {
        let (flag, _) = &*self.inner;
        flag.lock().map(|stopped| *stopped).unwrap_or(true)
    }

    /// Sleep for up to `duration`. Returns true if a stop request
    /// ended the wait early (or had already arrived).
    fn sleep(&self, duration: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let Ok(guard) = flag.lock() else {
            return true;
        };
        match cvar.wait_timeout_while(guard, duration, |stopped| !*stopped) {
            Ok((stopped, _)) => *stopped,
            Err(_) => true,
        }
    }
}

/// Thread-safe view of a running session: request cancellation and
/// read the current lifecycle phase. Cheap to clone; safe to use from
/// signal handlers and health probes.
#[derive(Clone)]
pub struct SessionHandle {
    stop: StopSignal,
    phase: Arc<Mutex<MonitorState>>,
}

impl SessionHandle {
    /// Request cancellation. Idempotent; wakes an in-progress sleep.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// The session's current lifecycle phase.
    pub fn current_state(&self) -> MonitorState {
        self.phase
            .lock()
            .map(|phase| *phase)
            .unwrap_or(MonitorState::Stopped)
    }
}

/// Final summary of a finished session.
#[derive(Debug, Serialize)]
pub struct SessionReport {
    pub session_id: String,
    pub query: String,
    pub stop_reason: StopReason,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub total_requests: u32,
    pub successful_checks: u32,
    pub failed_checks: u32,
    pub success_rate: f64,
    pub avg_response_ms: f64,
    pub detections: u32,
    pub notifications_sent: u32,
    pub events: Vec<LogEntry>,
}

/// Mutable per-session state. Owned exclusively by the loop; the only
/// piece visible outside is the phase, published through the handle.
struct SessionState {
    phase: MonitorState,
    current_interval: f64,
    request_count: u32,
    consecutive_errors: u32,
    started: Instant,
    last_notification: Option<Instant>,
    log: EventLog,
    metrics: SessionMetrics,
}

/// A monitoring session: query source + notifier + config, driven by
/// a single blocking control loop.
pub struct MonitorSession<S: SeatSource> {
    config: MonitorConfig,
    source: S,
    notifier: Notifier,
    stop: StopSignal,
    phase: Arc<Mutex<MonitorState>>,
}

impl<S: SeatSource> MonitorSession<S> {
    pub fn new(config: MonitorConfig, source: S, notifier: Notifier) -> Self {
        Self {
            config,
            source,
            notifier,
            stop: StopSignal::new(),
            phase: Arc::new(Mutex::new(MonitorState::Idle)),
        }
    }

    /// A handle for cancellation and health probes. May be taken any
    /// number of times, before or during `run`.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            stop: self.stop.clone(),
            phase: self.phase.clone(),
        }
    }

    /// Run the session to completion. Blocks until a resource limit
    /// trips or `SessionHandle::stop` is called, then drains and
    /// reports. Query errors and channel failures are absorbed along
    /// the way; this function does not fail.
    pub fn run(mut self, query: TrainQuery) -> SessionReport {
        let session_id = generate_session_id();
        let started_at = Utc::now();
        let mut st = SessionState {
            phase: MonitorState::Idle,
            current_interval: self.config.polling.base_interval_secs,
            request_count: 0,
            consecutive_errors: 0,
            started: Instant::now(),
            last_notification: None,
            log: EventLog::new(self.config.log_capacity()),
            metrics: SessionMetrics::new(),
        };

        self.transition(&mut st, MonitorState::Monitoring);
        st.log.append(format!("monitoring started: {}", query.summary()));
        st.log.append(format!(
            "limits: {} requests, {} consecutive errors, {}s session cap",
            self.config.limits.max_requests,
            self.config.limits.max_consecutive_errors,
            self.config.limits.max_session_secs,
        ));
        tracing::info!(session_id = %session_id, query = %query.summary(), "monitoring started");

        let stop_reason = loop {
            if let Some(reason) = governor::check_limits(
                st.started.elapsed(),
                st.request_count,
                st.consecutive_errors,
                &self.config.limits,
            ) {
                st.log.append(format!("{} - stopping session", reason.describe()));
                tracing::info!(reason = reason.describe(), "resource limit tripped");
                break reason;
            }

            if self.stop.is_stopped() {
                st.log.append("stop requested - shutting down");
                break StopReason::Cancelled;
            }

            let had_error = self.tick(&mut st, &query);

            let (next_interval, sleep) =
                scheduler::next_interval(st.current_interval, had_error, &self.config.polling);
            st.current_interval = next_interval;
            st.log
                .append(format!("next check in {:.1}s", sleep.as_secs_f64()));

            if self.stop.sleep(sleep) {
                st.log.append("stop requested during wait - shutting down");
                break StopReason::Cancelled;
            }
        };

        self.transition(&mut st, MonitorState::Stopped);

        // Draining: release the source's pooled connections before the
        // report is assembled, even on cancellation.
        self.source.close();
        st.log.append("session closed");

        let report = SessionReport {
            session_id,
            query: query.summary(),
            stop_reason,
            started_at,
            duration_secs: st.metrics.session_duration_secs(),
            total_requests: st.metrics.total_requests,
            successful_checks: st.metrics.successful_checks,
            failed_checks: st.metrics.failed_checks,
            success_rate: st.metrics.success_rate(),
            avg_response_ms: st.metrics.avg_response_ms(),
            detections: st.metrics.detections,
            notifications_sent: st.metrics.notifications_sent,
            events: st.log.into_entries(),
        };
        tracing::info!(
            session_id = %report.session_id,
            requests = report.total_requests,
            detections = report.detections,
            notifications = report.notifications_sent,
            reason = report.stop_reason.describe(),
            "session finished"
        );
        report
    }

    /// One poll cycle. Returns true if the check failed.
    fn tick(&mut self, st: &mut SessionState, query: &TrainQuery) -> bool {
        let t0 = Instant::now();
        st.request_count += 1;
        let check_no = st.request_count;

        match self.source.check(query) {
            Ok(result) => {
                let elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0;
                st.metrics.record_check(true, elapsed_ms);
                st.consecutive_errors = 0;

                let available = result.available_trains();
                if available.is_empty() {
                    st.log.append(format!(
                        "check #{check_no}: no seats available ({elapsed_ms:.0}ms)"
                    ));
                    return false;
                }

                self.transition(st, MonitorState::Detected);
                st.metrics.record_detection();
                let listing = available
                    .iter()
                    .take(MAX_REPORTED_TRAINS)
                    .map(|t| format!("    {}", t.display()))
                    .collect::<Vec<_>>()
                    .join("\n");
                st.log.append(format!(
                    "seats found on {} train(s):\n{listing}",
                    available.len()
                ));

                let event = NotificationEvent {
                    trains: available.into_iter().cloned().collect(),
                    detected_at: Utc::now(),
                };
                self.dispatch_notification(st, &event);
                self.transition(st, MonitorState::Monitoring);
                false
            }
            Err(err) => {
                let elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0;
                st.metrics.record_check(false, elapsed_ms);
                st.consecutive_errors += 1;

                self.transition(st, MonitorState::Error);
                st.log.append(format!(
                    "{} error ({} consecutive): {err}",
                    err.classification(),
                    st.consecutive_errors
                ));
                tracing::warn!(
                    classification = err.classification(),
                    consecutive = st.consecutive_errors,
                    error = %err,
                    "check failed"
                );
                self.transition(st, MonitorState::Monitoring);
                true
            }
        }
    }

    /// Invoke the dispatcher for a detection and fold its outcome into
    /// the session state. A fresh cooldown window starts only when at
    /// least one channel confirmed delivery.
    fn dispatch_notification(&self, st: &mut SessionState, event: &NotificationEvent) {
        let since_last = st.last_notification.map(|at| at.elapsed());
        let outcome = self
            .notifier
            .dispatch(event, since_last, self.config.notify.cooldown());

        match &outcome {
            DispatchOutcome::Suppressed { remaining } => {
                st.log.append(format!(
                    "notification suppressed by cooldown ({}s remaining)",
                    remaining.as_secs()
                ));
            }
            DispatchOutcome::Delivered(results) => {
                for result in results {
                    match &result.outcome {
                        Ok(()) => st
                            .log
                            .append(format!("notification sent via {}", result.channel.label())),
                        Err(err) => {
                            st.log.append(format!(
                                "notification via {} failed: {err}",
                                result.channel.label()
                            ));
                            tracing::warn!(
                                channel = result.channel.label(),
                                error = %err,
                                "notification channel failed"
                            );
                        }
                    }
                }
                if outcome.any_succeeded() {
                    st.last_notification = Some(Instant::now());
                    st.metrics.record_notification();
                }
            }
        }
    }

    /// Apply a state transition, publish it to handles, and record it.
    /// Illegal transitions are logged and ignored.
    fn transition(&self, st: &mut SessionState, to: MonitorState) {
        let from = st.phase;
        if !is_valid_transition(from, to) {
            tracing::warn!(
                from = from.label(),
                to = to.label(),
                "invalid state transition attempted"
            );
            return;
        }
        st.phase = to;
        if let Ok(mut published) = self.phase.lock() {
            *published = to;
        }
        st.log
            .append(format!("state: {} -> {}", from.label(), to.label()));
    }
}

fn generate_session_id() -> String {
    let uuid_short = uuid::Uuid::new_v4()
        .to_string()
        .split('-')
        .next()
        .unwrap_or("")
        .to_string();
    format!("watch-{uuid_short}-{}", Utc::now().timestamp())
}

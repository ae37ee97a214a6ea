//! Integration tests for the monitoring session: a scripted seat
//! source and in-memory notification channels drive the full loop
//! end to end, without touching the network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, NaiveTime, Utc};

use railwatch::korail::{QueryError, SeatSource};
use railwatch::models::config::{ChannelKind, MonitorConfig, PollingTuning, SessionLimits};
use railwatch::models::query::{CheckResult, SeatClass, TrainClass, TrainInfo, TrainQuery};
use railwatch::monitor::{MonitorSession, MonitorState, StopReason};
use railwatch::notify::{
    ChannelError, NotificationChannel, NotificationPayload, Notifier,
};

fn query() -> TrainQuery {
    TrainQuery::new(
        "서울".to_string(),
        "부산".to_string(),
        NaiveDate::from_ymd_opt(2026, 2, 14).unwrap(),
        NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        TrainClass::Ktx,
        SeatClass::General,
        2,
    )
    .unwrap()
}

fn fast_config() -> MonitorConfig {
    MonitorConfig {
        polling: PollingTuning {
            base_interval_secs: 0.001,
            max_interval_secs: 0.005,
            backoff_multiplier: 1.5,
            jitter_secs: 0.0,
        },
        limits: SessionLimits {
            max_session_secs: 120,
            max_requests: 50,
            max_consecutive_errors: 10,
        },
        ..MonitorConfig::default()
    }
}

fn seats(count: u32) -> Result<CheckResult, QueryError> {
    Ok(CheckResult {
        checked_at: Utc::now(),
        trains: vec![TrainInfo {
            train_no: "23".to_string(),
            train_class_name: "KTX".to_string(),
            departure_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            arrival_time: NaiveTime::from_hms_opt(12, 5, 0).unwrap(),
            general_seats: count,
            first_class_seats: 0,
            duration_minutes: 155,
        }],
        response_bytes: 2048,
    })
}

struct ScriptedSource {
    script: VecDeque<Result<CheckResult, QueryError>>,
    closed: Arc<AtomicBool>,
}

impl ScriptedSource {
    fn new(script: Vec<Result<CheckResult, QueryError>>) -> (Self, Arc<AtomicBool>) {
        let closed = Arc::new(AtomicBool::new(false));
        (
            Self {
                script: script.into(),
                closed: closed.clone(),
            },
            closed,
        )
    }
}

impl SeatSource for ScriptedSource {
    fn check(&mut self, _query: &TrainQuery) -> Result<CheckResult, QueryError> {
        self.script.pop_front().unwrap_or_else(|| seats(0))
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

struct RecordingChannel {
    kind: ChannelKind,
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl NotificationChannel for RecordingChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    fn send(&self, payload: &NotificationPayload) -> Result<(), ChannelError> {
        assert!(!payload.title.is_empty());
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(ChannelError::Http("hook gone".to_string()))
        } else {
            Ok(())
        }
    }
}

fn channel(kind: ChannelKind, fail: bool) -> (Box<dyn NotificationChannel>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    (
        Box::new(RecordingChannel {
            kind,
            calls: calls.clone(),
            fail,
        }),
        calls,
    )
}

#[test]
fn test_full_session_story() {
    // Two flaky checks, then a detection, then quiet until the
    // request budget trips.
    let (source, closed) = ScriptedSource::new(vec![
        Err(QueryError::Timeout("read timed out".to_string())),
        Err(QueryError::Network("reset by peer".to_string())),
        seats(0),
        seats(5),
    ]);
    let (desktop, desktop_calls) = channel(ChannelKind::Desktop, false);
    let (webhook, webhook_calls) = channel(ChannelKind::Webhook, true);
    let notifier = Notifier::with_channels(vec![desktop, webhook]);

    let mut config = fast_config();
    config.limits.max_requests = 8;

    let session = MonitorSession::new(config, source, notifier);
    let handle = session.handle();
    let report = session.run(query());

    assert_eq!(report.stop_reason, StopReason::RequestLimit);
    assert_eq!(report.total_requests, 8);
    assert_eq!(report.failed_checks, 2);
    assert_eq!(report.successful_checks, 6);
    assert_eq!(report.detections, 1);

    // Both channels were invoked once; the webhook failure did not
    // block the desktop channel, and a partial success still counts
    // as a sent notification.
    assert_eq!(desktop_calls.load(Ordering::SeqCst), 1);
    assert_eq!(webhook_calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.notifications_sent, 1);

    // The loop drained on exit.
    assert!(closed.load(Ordering::SeqCst));
    assert_eq!(handle.current_state(), MonitorState::Stopped);

    let messages: Vec<&str> = report.events.iter().map(|e| e.message.as_str()).collect();
    assert!(messages.iter().any(|m| m.contains("request limit")));
    assert!(messages.contains(&"state: MONITORING -> DETECTED"));
    assert!(messages.contains(&"state: DETECTED -> MONITORING"));
    assert!(messages
        .iter()
        .any(|m| m.contains("notification via webhook failed")));
}

#[test]
fn test_repeated_detections_respect_cooldown() {
    let (source, _) = ScriptedSource::new(vec![seats(3), seats(3), seats(3)]);
    let (sound, calls) = channel(ChannelKind::Sound, false);
    let notifier = Notifier::with_channels(vec![sound]);

    let mut config = fast_config();
    config.limits.max_requests = 3;
    // Cooldown far longer than the whole session
    config.notify.cooldown_secs = 300;

    let session = MonitorSession::new(config, source, notifier);
    let report = session.run(query());

    assert_eq!(report.detections, 3);
    assert_eq!(report.notifications_sent, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_all_channels_failing_leaves_cooldown_open() {
    let (source, _) = ScriptedSource::new(vec![seats(3), seats(3)]);
    let (webhook, calls) = channel(ChannelKind::Webhook, true);
    let notifier = Notifier::with_channels(vec![webhook]);

    let mut config = fast_config();
    config.limits.max_requests = 2;
    config.notify.cooldown_secs = 300;

    let session = MonitorSession::new(config, source, notifier);
    let report = session.run(query());

    // No dispatch succeeded, so no cooldown window ever started and
    // the second detection retried the channel.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(report.notifications_sent, 0);
}

#[test]
fn test_stop_interrupts_backoff_sleep_promptly() {
    let (source, closed) = ScriptedSource::new(vec![]);
    let (sound, _) = channel(ChannelKind::Sound, false);
    let notifier = Notifier::with_channels(vec![sound]);

    // Realistic intervals: after the first check the loop would sleep
    // for ~30s. Cancellation must cut through that sleep.
    let config = MonitorConfig::default();
    let session = MonitorSession::new(config, source, notifier);
    let handle = session.handle();

    let stopper = std::thread::spawn({
        let handle = handle.clone();
        move || {
            std::thread::sleep(Duration::from_millis(150));
            handle.stop();
        }
    });

    let started = Instant::now();
    let report = session.run(query());
    let elapsed = started.elapsed();

    stopper.join().unwrap();

    assert_eq!(report.stop_reason, StopReason::Cancelled);
    assert!(
        elapsed < Duration::from_secs(5),
        "cancellation took {elapsed:?}, sleep was not interrupted"
    );
    // Draining and the final report still happened.
    assert!(closed.load(Ordering::SeqCst));
    assert!(report
        .events
        .iter()
        .any(|e| e.message.contains("shutting down")));
    assert_eq!(handle.current_state(), MonitorState::Stopped);
}

#[test]
fn test_session_expiry_trips_first() {
    let (source, _) = ScriptedSource::new(vec![]);
    let (sound, _) = channel(ChannelKind::Sound, false);
    let notifier = Notifier::with_channels(vec![sound]);

    let mut config = fast_config();
    config.limits.max_session_secs = 0;

    let session = MonitorSession::new(config, source, notifier);
    let report = session.run(query());

    // With a zero-second budget the first tick's governor check sees
    // an expired session before any request is issued... unless the
    // clock has not advanced yet, in which case the loop runs until
    // it has. Either way the reason is expiry, not a request limit.
    assert_eq!(report.stop_reason, StopReason::SessionExpired);
    assert!(report.total_requests < 50);
}

#[test]
fn test_report_serializes() {
    let (source, _) = ScriptedSource::new(vec![seats(2)]);
    let (sound, _) = channel(ChannelKind::Sound, false);
    let notifier = Notifier::with_channels(vec![sound]);

    let mut config = fast_config();
    config.limits.max_requests = 2;

    let session = MonitorSession::new(config, source, notifier);
    let report = session.run(query());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["stop_reason"], "request-limit");
    assert_eq!(json["detections"], 1);
    assert!(json["session_id"].as_str().unwrap().starts_with("watch-"));
}

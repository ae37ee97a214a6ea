//! Multi-channel notification dispatch.
//!
//! One detection produces at most one dispatch. The dispatcher applies
//! a session-wide cooldown gate, then fans out to every enabled
//! channel concurrently. Channel failures, panics included, are
//! captured per channel and never reach the session loop.

pub mod desktop;
pub mod sound;
pub mod webhook;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::config::{ChannelKind, NotifyConfig};
use crate::models::constants::MAX_REPORTED_TRAINS;
use crate::models::query::TrainInfo;

use desktop::DesktopChannel;
use sound::SoundChannel;
use webhook::WebhookChannel;

/// Why a single channel delivery failed. Channel failures are logged
/// and isolated; they never escalate.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("notifier command failed: {0}")]
    Command(String),

    #[error("webhook request failed: {0}")]
    Http(String),

    #[error("channel timed out after {0:?}")]
    Timeout(Duration),

    #[error("channel panicked: {0}")]
    Panicked(String),
}

/// What the state machine hands the dispatcher on detection: the
/// bookable trains and when they were seen. Created per detection,
/// consumed by one dispatch, then discarded.
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub trains: Vec<TrainInfo>,
    pub detected_at: DateTime<Utc>,
}

/// Rendered message shared by all channels for one dispatch.
#[derive(Debug, Clone)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub summary: String,
}

impl NotificationPayload {
    /// Render an event into the message block. At most
    /// [`MAX_REPORTED_TRAINS`] trains are listed; the rest are
    /// silently truncated.
    pub fn from_event(event: &NotificationEvent) -> Self {
        let body = event
            .trains
            .iter()
            .take(MAX_REPORTED_TRAINS)
            .map(|t| format!("  {}", t.display()))
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            title: "Korail seats available!".to_string(),
            body,
            summary: format!("{} train(s) with open seats", event.trains.len()),
        }
    }
}

/// One notification delivery mechanism. Implementations enforce their
/// own timeout and report failure as a value; the dispatcher converts
/// anything that still unwinds into a [`ChannelError::Panicked`].
pub trait NotificationChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    fn send(&self, payload: &NotificationPayload) -> Result<(), ChannelError>;
}

/// Delivery result for one channel within one dispatch.
#[derive(Debug)]
pub struct ChannelResult {
    pub channel: ChannelKind,
    pub outcome: Result<(), ChannelError>,
}

/// What a dispatch call did.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The cooldown gate was closed; no channel was invoked.
    Suppressed { remaining: Duration },
    /// All enabled channels were invoked; one result each.
    Delivered(Vec<ChannelResult>),
}

impl DispatchOutcome {
    /// True if at least one channel confirmed delivery.
    pub fn any_succeeded(&self) -> bool {
        match self {
            Self::Suppressed { .. } => false,
            Self::Delivered(results) => results.iter().any(|r| r.outcome.is_ok()),
        }
    }
}

/// The dispatcher: a fixed set of channels built once from config.
pub struct Notifier {
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl Notifier {
    /// Build the enabled channels. Enabling the webhook channel
    /// without an endpoint is a configuration error, caught here
    /// rather than on every dispatch.
    pub fn from_config(config: &NotifyConfig) -> Result<Self> {
        let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();
        for kind in &config.channels {
            match kind {
                ChannelKind::Desktop => channels.push(Box::new(DesktopChannel::new())),
                ChannelKind::Sound => channels.push(Box::new(SoundChannel::new())),
                ChannelKind::Webhook => {
                    let Some(url) = config.webhook_url.as_deref() else {
                        bail!(
                            "webhook channel enabled but no webhook URL configured \
                             (set notify.webhook_url or RAILWATCH_WEBHOOK_URL)"
                        );
                    };
                    channels.push(Box::new(WebhookChannel::new(url.to_string())?));
                }
            }
        }
        Ok(Self { channels })
    }

    /// Custom channel set; used by tests and by callers embedding the
    /// dispatcher with their own delivery mechanisms.
    pub fn with_channels(channels: Vec<Box<dyn NotificationChannel>>) -> Self {
        Self { channels }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Run one dispatch.
    ///
    /// `since_last` is the time since the previous successful dispatch
    /// (None if there was none). Inside the cooldown window nothing is
    /// invoked; otherwise every channel runs concurrently and each
    /// failure is captured in its own result. Never panics, never
    /// returns an error.
    pub fn dispatch(
        &self,
        event: &NotificationEvent,
        since_last: Option<Duration>,
        cooldown: Duration,
    ) -> DispatchOutcome {
        if let Some(since) = since_last {
            if since < cooldown {
                return DispatchOutcome::Suppressed {
                    remaining: cooldown - since,
                };
            }
        }

        let payload = NotificationPayload::from_event(event);

        let results = thread::scope(|scope| {
            let handles: Vec<_> = self
                .channels
                .iter()
                .map(|channel| {
                    let payload = &payload;
                    let kind = channel.kind();
                    let handle = scope.spawn(move || {
                        catch_unwind(AssertUnwindSafe(|| channel.send(payload)))
                            .unwrap_or_else(|panic| {
                                Err(ChannelError::Panicked(panic_message(&panic)))
                            })
                    });
                    (kind, handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(kind, handle)| ChannelResult {
                    channel: kind,
                    outcome: handle.join().unwrap_or_else(|_| {
                        Err(ChannelError::Panicked("channel thread died".to_string()))
                    }),
                })
                .collect()
        });

        DispatchOutcome::Delivered(results)
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

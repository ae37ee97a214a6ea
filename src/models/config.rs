use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::constants::{
    http, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_BASE_INTERVAL_SECS, DEFAULT_JITTER_SECS,
    DEFAULT_MAX_CONSECUTIVE_ERRORS, DEFAULT_MAX_INTERVAL_SECS, DEFAULT_MAX_LOG_ENTRIES,
    DEFAULT_MAX_REQUESTS, DEFAULT_MAX_SESSION_SECS, DEFAULT_NOTIFICATION_COOLDOWN_SECS,
};

/// Environment variable that overrides the configured webhook endpoint.
pub const WEBHOOK_URL_ENV: &str = "RAILWATCH_WEBHOOK_URL";

/// A notification delivery mechanism that can be enabled for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Desktop,
    Sound,
    Webhook,
}

impl ChannelKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Sound => "sound",
            Self::Webhook => "webhook",
        }
    }
}

impl FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "desktop" => Ok(Self::Desktop),
            "sound" => Ok(Self::Sound),
            "webhook" => Ok(Self::Webhook),
            other => Err(format!(
                "unknown notification channel '{other}' (expected desktop, sound, or webhook)"
            )),
        }
    }
}

/// Parse a comma-separated channel list, e.g. `desktop,sound,webhook`.
pub fn parse_channel_list(s: &str) -> std::result::Result<Vec<ChannelKind>, String> {
    let mut channels = Vec::new();
    for part in s.split(',').filter(|p| !p.trim().is_empty()) {
        let kind: ChannelKind = part.parse()?;
        if !channels.contains(&kind) {
            channels.push(kind);
        }
    }
    if channels.is_empty() {
        return Err("at least one notification channel is required".to_string());
    }
    Ok(channels)
}

/// Adaptive-interval tuning for the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingTuning {
    pub base_interval_secs: f64,
    pub max_interval_secs: f64,
    pub backoff_multiplier: f64,
    pub jitter_secs: f64,
}

impl Default for PollingTuning {
    fn default() -> Self {
        Self {
            base_interval_secs: DEFAULT_BASE_INTERVAL_SECS,
            max_interval_secs: DEFAULT_MAX_INTERVAL_SECS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            jitter_secs: DEFAULT_JITTER_SECS,
        }
    }
}

/// Hard resource ceilings that terminate the session when reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionLimits {
    pub max_session_secs: u64,
    pub max_requests: u32,
    pub max_consecutive_errors: u32,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_session_secs: DEFAULT_MAX_SESSION_SECS,
            max_requests: DEFAULT_MAX_REQUESTS,
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
        }
    }
}

impl SessionLimits {
    pub fn max_session_duration(&self) -> Duration {
        Duration::from_secs(self.max_session_secs)
    }
}

/// Notification behavior: spacing, enabled channels, webhook target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub cooldown_secs: u64,
    pub channels: Vec<ChannelKind>,
    pub webhook_url: Option<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: DEFAULT_NOTIFICATION_COOLDOWN_SECS,
            channels: vec![ChannelKind::Desktop, ChannelKind::Sound],
            webhook_url: None,
        }
    }
}

impl NotifyConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

/// Timeouts for the upstream HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: http::CONNECT_TIMEOUT_SECS,
            request_timeout_secs: http::REQUEST_TIMEOUT_SECS,
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Complete session configuration.
///
/// Assembled once at startup (file, then environment, then CLI
/// overrides) and treated as immutable for the session's lifetime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub polling: PollingTuning,
    pub limits: SessionLimits,
    pub notify: NotifyConfig,
    pub http: HttpConfig,
    pub max_log_entries: Option<usize>,
}

impl MonitorConfig {
    /// Effective event-log capacity.
    pub fn log_capacity(&self) -> usize {
        self.max_log_entries.unwrap_or(DEFAULT_MAX_LOG_ENTRIES)
    }

    /// Load configuration from an explicit path, or from the default
    /// location (`~/.config/railwatch/config.toml`) when it exists,
    /// falling back to built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn default_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|d| d.join("railwatch").join("config.toml"))
    }

    /// Resolve environment overrides into the config. Called once at
    /// startup; the environment is not consulted again afterwards.
    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(WEBHOOK_URL_ENV) {
            if !url.trim().is_empty() {
                self.notify.webhook_url = Some(url);
            }
        }
    }
}

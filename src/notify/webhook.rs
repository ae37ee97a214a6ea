//! Webhook notification channel (Slack/Discord-style incoming hooks).

use std::time::Duration;

use anyhow::{Context, Result};

use crate::models::config::ChannelKind;
use crate::models::constants::http;

use super::{ChannelError, NotificationChannel, NotificationPayload};

pub struct WebhookChannel {
    url: String,
    client: reqwest::blocking::Client,
}

impl WebhookChannel {
    /// Build the channel with its own pooled client. The request
    /// timeout is the channel's deadline; the dispatcher relies on it.
    pub fn new(url: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(http::CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(http::WEBHOOK_TIMEOUT_SECS))
            .user_agent("railwatch")
            .build()
            .context("Failed to create webhook HTTP client")?;
        Ok(Self { url, client })
    }
}

impl NotificationChannel for WebhookChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Webhook
    }

    fn send(&self, payload: &NotificationPayload) -> Result<(), ChannelError> {
        let text = format!("*{}*\n{}\n{}", payload.title, payload.summary, payload.body);

        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ChannelError::Timeout(Duration::from_secs(http::WEBHOOK_TIMEOUT_SECS))
                } else {
                    ChannelError::Http(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(ChannelError::Http(format!(
                "webhook returned HTTP {}",
                response.status().as_u16()
            )));
        }
        Ok(())
    }
}

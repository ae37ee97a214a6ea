//! Desktop notification channel.
//!
//! Uses `notify-send` on Linux and `osascript` on macOS. The helper
//! process is given a hard deadline so a wedged notification daemon
//! cannot stall the dispatcher.

use std::process::{Command, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::models::config::ChannelKind;

use super::{ChannelError, NotificationChannel, NotificationPayload};

/// Default deadline for the notification helper process.
const HELPER_TIMEOUT: Duration = Duration::from_secs(10);

/// Desktop notifications are one-line affairs; longer bodies are cut.
const MAX_BODY_CHARS: usize = 200;

pub struct DesktopChannel {
    timeout: Duration,
}

impl DesktopChannel {
    pub fn new() -> Self {
        Self {
            timeout: HELPER_TIMEOUT,
        }
    }

    fn build_command(payload: &NotificationPayload) -> Command {
        let body = truncate_chars(&payload.body, MAX_BODY_CHARS);

        if cfg!(target_os = "macos") {
            let script = format!(
                r#"display notification "{}" with title "{}" sound name "Glass""#,
                body.replace('"', r#"\""#),
                payload.title.replace('"', r#"\""#),
            );
            let mut cmd = Command::new("osascript");
            cmd.arg("-e").arg(script);
            cmd
        } else {
            let mut cmd = Command::new("notify-send");
            cmd.arg("--urgency=critical")
                .arg("--app-name=railwatch")
                .arg(&payload.title)
                .arg(body);
            cmd
        }
    }
}

impl Default for DesktopChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationChannel for DesktopChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Desktop
    }

    fn send(&self, payload: &NotificationPayload) -> Result<(), ChannelError> {
        let mut child = Self::build_command(payload)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ChannelError::Command(format!("failed to launch notifier: {e}")))?;

        match child
            .wait_timeout(self.timeout)
            .map_err(|e| ChannelError::Command(format!("failed to wait for notifier: {e}")))?
        {
            Some(status) if status.success() => Ok(()),
            Some(status) => Err(ChannelError::Command(format!(
                "notifier exited with {status}"
            ))),
            None => {
                let _ = child.kill();
                let _ = child.wait();
                Err(ChannelError::Timeout(self.timeout))
            }
        }
    }
}

/// Character-boundary-safe truncation; the payload may contain Hangul.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_is_char_safe() {
        let korean = "서울부산대전".repeat(60);
        let cut = truncate_chars(&korean, MAX_BODY_CHARS);
        assert_eq!(cut.chars().count(), MAX_BODY_CHARS);

        let short = "short";
        assert_eq!(truncate_chars(short, MAX_BODY_CHARS), "short");
    }
}

//! Terminal-bell notification channel.

use std::io::Write;

use crate::models::config::ChannelKind;

use super::{ChannelError, NotificationChannel, NotificationPayload};

/// Rings the terminal bell a few times. Deliberately the dumbest
/// channel there is: it works over SSH and needs no desktop session.
pub struct SoundChannel {
    repeats: u8,
}

impl SoundChannel {
    pub fn new() -> Self {
        Self { repeats: 3 }
    }
}

impl Default for SoundChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationChannel for SoundChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Sound
    }

    fn send(&self, _payload: &NotificationPayload) -> Result<(), ChannelError> {
        let mut stdout = std::io::stdout();
        for _ in 0..self.repeats {
            stdout
                .write_all(b"\x07")
                .map_err(|e| ChannelError::Command(format!("failed to ring bell: {e}")))?;
        }
        stdout
            .flush()
            .map_err(|e| ChannelError::Command(format!("failed to flush bell: {e}")))
    }
}

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a monitoring session.
///
/// State machine transitions:
/// - `Idle` -> `Monitoring` (session start)
/// - `Monitoring` -> `Detected` (a check found bookable seats)
/// - `Detected` -> `Monitoring` (dispatcher invoked, loop continues)
/// - `Monitoring` -> `Error` -> `Monitoring` (failed check; `Error` is
///   transient and never terminal by itself)
/// - any state -> `Stopped` (resource limit trip or cancellation)
/// - `Stopped` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorState {
    /// Created, not yet started.
    Idle,
    /// Polling on the adaptive interval.
    Monitoring,
    /// Seats found; notification pending within this tick.
    Detected,
    /// Terminal: limits tripped or cancellation requested.
    Stopped,
    /// A check failed; re-enters `Monitoring` once recorded.
    Error,
}

impl MonitorState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Monitoring => "MONITORING",
            Self::Detected => "DETECTED",
            Self::Stopped => "STOPPED",
            Self::Error => "ERROR",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// Whether moving from `from` to `to` is a legal transition.
pub fn is_valid_transition(from: MonitorState, to: MonitorState) -> bool {
    use MonitorState::*;
    match from {
        Idle => matches!(to, Monitoring | Stopped),
        Monitoring => matches!(to, Detected | Error | Stopped),
        Detected => matches!(to, Monitoring | Stopped),
        Error => matches!(to, Monitoring | Stopped),
        Stopped => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MonitorState::*;

    #[test]
    fn test_normal_lifecycle() {
        assert!(is_valid_transition(Idle, Monitoring));
        assert!(is_valid_transition(Monitoring, Detected));
        assert!(is_valid_transition(Detected, Monitoring));
        assert!(is_valid_transition(Monitoring, Error));
        assert!(is_valid_transition(Error, Monitoring));
    }

    #[test]
    fn test_every_state_can_stop() {
        for from in [Idle, Monitoring, Detected, Error] {
            assert!(is_valid_transition(from, Stopped), "{from:?} -> Stopped");
        }
    }

    #[test]
    fn test_stopped_is_terminal() {
        for to in [Idle, Monitoring, Detected, Error, Stopped] {
            assert!(!is_valid_transition(Stopped, to), "Stopped -> {to:?}");
        }
        assert!(Stopped.is_terminal());
        assert!(!Error.is_terminal());
    }

    #[test]
    fn test_error_is_not_reachable_from_detected() {
        assert!(!is_valid_transition(Detected, Error));
        assert!(!is_valid_transition(Idle, Detected));
        assert!(!is_valid_transition(Error, Detected));
    }
}

//! Per-session runtime counters.

use std::time::Instant;

use crate::models::constants::RESPONSE_TIME_WINDOW;

/// Counters accumulated over one session, summarized into the final
/// report. Response times are kept in a bounded rolling window that is
/// halved when full.
#[derive(Debug)]
pub struct SessionMetrics {
    started: Instant,
    pub total_requests: u32,
    pub successful_checks: u32,
    pub failed_checks: u32,
    pub detections: u32,
    pub notifications_sent: u32,
    response_times_ms: Vec<f64>,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            total_requests: 0,
            successful_checks: 0,
            failed_checks: 0,
            detections: 0,
            notifications_sent: 0,
            response_times_ms: Vec::new(),
        }
    }

    pub fn record_check(&mut self, success: bool, elapsed_ms: f64) {
        self.total_requests += 1;
        if success {
            self.successful_checks += 1;
        } else {
            self.failed_checks += 1;
        }
        self.response_times_ms.push(elapsed_ms);
        if self.response_times_ms.len() > RESPONSE_TIME_WINDOW {
            let drop = self.response_times_ms.len() - RESPONSE_TIME_WINDOW / 2;
            self.response_times_ms.drain(..drop);
        }
    }

    pub fn record_detection(&mut self) {
        self.detections += 1;
    }

    pub fn record_notification(&mut self) {
        self.notifications_sent += 1;
    }

    /// Mean response time over the retained window, in milliseconds.
    pub fn avg_response_ms(&self) -> f64 {
        if self.response_times_ms.is_empty() {
            return 0.0;
        }
        self.response_times_ms.iter().sum::<f64>() / self.response_times_ms.len() as f64
    }

    /// Share of successful checks, as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        f64::from(self.successful_checks) / f64::from(self.total_requests) * 100.0
    }

    pub fn session_duration_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

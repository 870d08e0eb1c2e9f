//! Progress reporting and ETA estimation.

use std::time::{Duration, Instant};

/// Estimated time left, `elapsed × total / completed − elapsed`.
///
/// `None` until something has been completed.
pub fn estimate_remaining(elapsed: Duration, completed: usize, total: usize) -> Option<Duration> {
    if completed == 0 {
        return None;
    }
    let elapsed_secs = elapsed.as_secs_f64();
    let projected = elapsed_secs * total as f64 / completed as f64;
    Some(Duration::from_secs_f64((projected - elapsed_secs).max(0.0)))
}

/// Decides when a batch reports progress.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    interval: Duration,
    started: Option<Instant>,
    last_report: Option<Instant>,
}

impl ProgressTracker {
    /// Tracker reporting at most once per `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            started: None,
            last_report: None,
        }
    }

    /// Mark the first commit.
    pub fn start(&mut self, now: Instant) {
        self.started = Some(now);
        self.last_report = Some(now);
    }

    /// Time since the first commit.
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.started
            .map(|started| now.saturating_duration_since(started))
            .unwrap_or_default()
    }

    /// Whether a report is due, recording it if so.
    pub fn due(&mut self, now: Instant) -> bool {
        match self.last_report {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_report = Some(now);
                true
            }
        }
    }

    /// Completion percentage.
    pub fn percent(completed: usize, total: usize) -> f64 {
        if total == 0 {
            100.0
        } else {
            completed as f64 * 100.0 / total as f64
        }
    }
}

//! Fixed-rate tick loop for hosts without their own game loop.

use crate::scheduler::CooperativeScheduler;
use pathforge_core::BlockWorld;
use std::time::{Duration, Instant};

/// Drives a [`CooperativeScheduler`] at a fixed tick rate.
#[derive(Debug, Clone)]
pub struct TickDriver {
    tick_interval: Duration,
    max_ticks: Option<u64>,
}

impl TickDriver {
    /// Driver ticking `tick_rate_hz` times per second. Zero runs ticks
    /// back to back.
    pub fn new(tick_rate_hz: u32) -> Self {
        let tick_interval = if tick_rate_hz == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(1.0 / f64::from(tick_rate_hz))
        };
        Self {
            tick_interval,
            max_ticks: None,
        }
    }

    /// Stop after this many ticks even if work remains.
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Tick until the scheduler is idle. Returns the number of ticks run.
    pub fn run_until_idle(
        &self,
        scheduler: &mut CooperativeScheduler,
        world: &mut dyn BlockWorld,
    ) -> u64 {
        let mut ticks = 0;
        while !scheduler.is_idle() {
            if self.max_ticks.is_some_and(|max| ticks >= max) {
                tracing::warn!(ticks, "tick limit reached with work remaining");
                break;
            }
            let started = Instant::now();
            scheduler.tick(world);
            ticks += 1;

            let spent = started.elapsed();
            if spent < self.tick_interval {
                std::thread::sleep(self.tick_interval - spent);
            } else if !self.tick_interval.is_zero() {
                tracing::trace!(spent_ms = spent.as_millis() as u64, "tick overran");
            }
        }
        tracing::debug!(ticks, "scheduler idle");
        ticks
    }
}

impl Default for TickDriver {
    /// Twenty ticks per second.
    fn default() -> Self {
        Self::new(20)
    }
}

//! # Poll Schedule
//!
//! Fixed-cadence polling with an optional upper bound on the total wait.
//! Commissioning and deployment both poll every few seconds without backoff or
//! jitter; the bound turns a machine stuck in a transient state into a
//! timed-out outcome instead of an endless loop.

use std::time::Duration;
use tokio::time::Instant;

/// Poll cadence and deadline for one lifecycle phase
#[derive(Debug, Clone)]
pub struct PollSchedule {
    /// Delay before every poll
    interval: Duration,
    /// Total time allowed for the phase, `None` for unbounded
    max_wait: Option<Duration>,
    started: Instant,
    polls: u32,
}

impl PollSchedule {
    /// Start a schedule now
    #[must_use]
    pub fn new(interval: Duration, max_wait: Option<Duration>) -> Self {
        Self {
            interval,
            max_wait,
            started: Instant::now(),
            polls: 0,
        }
    }

    /// Sleep until the next poll is due
    pub async fn wait(&mut self) {
        tokio::time::sleep(self.interval).await;
        self.polls += 1;
    }

    /// Whether the phase has used up its allowed time
    pub fn expired(&self) -> bool {
        self.max_wait
            .is_some_and(|max_wait| self.started.elapsed() >= max_wait)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Number of polls performed so far
    pub fn polls(&self) -> u32 {
        self.polls
    }
}

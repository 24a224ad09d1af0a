//! Activity clock: when did the current transfer last make progress?

use std::time::{Duration, Instant};

/// Timestamp of the last observed forward progress (or relevant state change)
/// of one transfer session. Timeouts are measured from here, not from job start.
#[derive(Debug, Clone, Copy)]
pub struct ActivityClock {
    last_activity: Instant,
}

impl ActivityClock {
    pub fn new() -> Self {
        Self {
            last_activity: Instant::now(),
        }
    }

    /// Mark "now" as the most recent activity.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn elapsed(&self) -> Duration {
        self.last_activity.elapsed()
    }

    /// Time left before `timeout` of inactivity is reached; zero once elapsed.
    pub fn remaining(&self, timeout: Duration) -> Duration {
        timeout.saturating_sub(self.elapsed())
    }
}

impl Default for ActivityClock {
    fn default() -> Self {
        Self::new()
    }
}

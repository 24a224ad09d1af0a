//! Completion waiter: blocks the worker thread until a transfer session
//! finishes, stalls past the inactivity timeout, or processing is disabled.
//!
//! The waiter is a monitor (mutex + condvar). Three things wake it: activity
//! reported by the session's observer, the timeout deadline, and
//! `set_enabled(false)` / `interrupt()` from another thread.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use crate::activity::ActivityClock;
use crate::outcome::Outcome;
use crate::session::{SessionObserver, SessionState, TransferSession};

struct WaitState {
    enabled: bool,
    interrupted: bool,
    /// Bumped on every wait; observers from earlier sessions carry a stale value.
    generation: u64,
    clock: ActivityClock,
}

struct Monitor {
    state: Mutex<WaitState>,
    wake: Condvar,
}

impl Monitor {
    fn lock(&self) -> MutexGuard<'_, WaitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Waits for one session at a time. Long-lived: the enabled flag outlives jobs,
/// the activity clock is reset at the start of each wait.
pub struct CompletionWaiter {
    monitor: Arc<Monitor>,
}

impl CompletionWaiter {
    pub fn new() -> Self {
        Self {
            monitor: Arc::new(Monitor {
                state: Mutex::new(WaitState {
                    enabled: true,
                    interrupted: false,
                    generation: 0,
                    clock: ActivityClock::new(),
                }),
                wake: Condvar::new(),
            }),
        }
    }

    /// Disabling wakes a blocked wait, which then returns `Aborted` unless the
    /// session already reached a terminal state.
    pub fn set_enabled(&self, enabled: bool) {
        let mut st = self.monitor.lock();
        st.enabled = enabled;
        self.monitor.wake.notify_all();
    }

    pub fn is_enabled(&self) -> bool {
        self.monitor.lock().enabled
    }

    /// Host shutdown: the current wait and every later one end as `Aborted`.
    pub fn interrupt(&self) {
        let mut st = self.monitor.lock();
        st.interrupted = true;
        self.monitor.wake.notify_all();
    }

    /// Block until `session` is done, errored, inactive for `timeout_ms`, or
    /// this waiter is disabled. `timeout_ms == 0` disables the inactivity
    /// timeout. `session` must already be started.
    pub fn wait_for_completion_or_timeout(
        &self,
        session: &dyn TransferSession,
        timeout_ms: u64,
    ) -> Outcome {
        let timeout = Duration::from_millis(timeout_ms);
        let generation = {
            let mut st = self.monitor.lock();
            st.generation += 1;
            st.clock.touch();
            st.generation
        };
        session.add_observer(self.activity_observer(generation));

        let mut st = self.monitor.lock();
        loop {
            match session.state() {
                SessionState::Done => return Outcome::Completed,
                SessionState::Error => return Outcome::Error,
                _ => {}
            }
            let remaining = if timeout.is_zero() {
                None
            } else {
                let remaining = st.clock.remaining(timeout);
                if remaining.is_zero() {
                    return Outcome::TimedOut;
                }
                Some(remaining)
            };
            if !st.enabled || st.interrupted {
                return Outcome::Aborted;
            }
            st = match remaining {
                None => self
                    .monitor
                    .wake
                    .wait(st)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(remaining) => {
                    self.monitor
                        .wake
                        .wait_timeout(st, remaining)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    /// Observer that advances the activity clock on genuine progress. While the
    /// session is running, a notification without increased completion is a
    /// no-op; any other notification counts as activity.
    fn activity_observer(&self, generation: u64) -> SessionObserver {
        let monitor: Weak<Monitor> = Arc::downgrade(&self.monitor);
        let mut last_completion = -1.0f32;
        Box::new(move |snapshot| {
            if snapshot.state == SessionState::Running {
                if snapshot.completion <= last_completion {
                    return;
                }
                last_completion = snapshot.completion;
            }
            let Some(monitor) = monitor.upgrade() else {
                return;
            };
            let mut st = monitor.lock();
            if st.generation != generation {
                return;
            }
            st.clock.touch();
            monitor.wake.notify_all();
        })
    }
}

impl Default for CompletionWaiter {
    fn default() -> Self {
        Self::new()
    }
}

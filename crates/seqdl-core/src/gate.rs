//! Suspension gate: reference-counted abort signals in front of the job runner.
//!
//! Every abort signal is counted when it is received and uncounted when the
//! worker reaches it in the inbox. The runner is disabled while at least one
//! signal is outstanding, so overlapping aborts keep processing suspended until
//! the last one is acknowledged.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::worker::Suspendable;

pub struct SuspensionGate {
    pending_aborts: Mutex<usize>,
    target: Arc<dyn Suspendable>,
}

impl SuspensionGate {
    pub fn new(target: Arc<dyn Suspendable>) -> Self {
        Self {
            pending_aborts: Mutex::new(0),
            target,
        }
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.pending_aborts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Count one more outstanding abort. The first one disables the target,
    /// waking any wait in progress. Returns the new count.
    pub fn on_abort_signal_received(&self) -> usize {
        let mut pending = self.lock();
        *pending += 1;
        if *pending == 1 {
            self.target.set_enabled(false);
        }
        tracing::debug!(pending = *pending, "abort signal received");
        *pending
    }

    /// Retire one outstanding abort. The last one re-enables the target.
    /// Without any outstanding abort this is a logged no-op. Returns the new count.
    pub fn on_abort_signal_acknowledged(&self) -> usize {
        let mut pending = self.lock();
        if *pending == 0 {
            tracing::warn!("abort acknowledged with no abort pending; ignoring");
            return 0;
        }
        *pending -= 1;
        if *pending == 0 {
            self.target.set_enabled(true);
        }
        tracing::debug!(pending = *pending, "abort signal acknowledged");
        *pending
    }

    pub fn is_enabled(&self) -> bool {
        *self.lock() == 0
    }

    pub fn pending_aborts(&self) -> usize {
        *self.lock()
    }
}

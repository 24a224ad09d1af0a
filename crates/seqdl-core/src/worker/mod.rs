//! Sequential worker: one inbox, one job at a time, abort signals counted by
//! the suspension gate.
//!
//! A request takes effect in two places. [`WorkerCore::dispatch`] runs on the
//! caller's thread the moment a request is delivered (an abort disables the
//! runner right away). [`WorkerCore::process`] runs on the worker thread when
//! the request reaches the head of the inbox (an abort is acknowledged, a job
//! runs or, while suspended, is dropped).

mod handle;

pub use handle::{WorkerError, WorkerHandle};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::gate::SuspensionGate;
use crate::job::Job;
use crate::outcome::Outcome;

/// Something that can be told to stop (and later resume) processing.
pub trait Suspendable: Send + Sync {
    fn set_enabled(&self, enabled: bool);
}

/// Runs one job to its outcome, blocking the calling thread.
pub trait JobRunner: Suspendable {
    fn run_job(&self, job: &Job) -> Outcome;

    /// Host shutdown: end the job in flight, if any.
    fn interrupt(&self) {}
}

/// One inbox entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Abort,
    Job(Job),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    ProcessingAbort,
    ProcessingJob,
}

/// Worker logic without the thread; [`WorkerHandle`] drives it from a
/// dedicated thread.
pub struct WorkerCore<R: JobRunner> {
    runner: Arc<R>,
    gate: SuspensionGate,
    state: Mutex<WorkerState>,
    draining: AtomicBool,
}

impl<R: JobRunner + 'static> WorkerCore<R> {
    pub fn new(runner: Arc<R>) -> Self {
        let target: Arc<dyn Suspendable> = runner.clone();
        Self {
            gate: SuspensionGate::new(target),
            runner,
            state: Mutex::new(WorkerState::Idle),
            draining: AtomicBool::new(false),
        }
    }
}

impl<R: JobRunner> WorkerCore<R> {
    pub fn runner(&self) -> &Arc<R> {
        &self.runner
    }

    pub fn gate(&self) -> &SuspensionGate {
        &self.gate
    }

    pub fn state(&self) -> WorkerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: WorkerState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Delivery-time effects. Call before the request is queued.
    pub fn dispatch(&self, request: &Request) {
        if let Request::Abort = request {
            self.gate.on_abort_signal_received();
        }
    }

    /// Dequeue-time effects. Returns the job's outcome when a job actually ran.
    pub fn process(&self, request: Request) -> Option<Outcome> {
        match request {
            Request::Abort => {
                self.set_state(WorkerState::ProcessingAbort);
                self.gate.on_abort_signal_acknowledged();
                self.set_state(WorkerState::Idle);
                None
            }
            Request::Job(job) => {
                if self.draining.load(Ordering::Acquire) {
                    tracing::debug!(source = job.source(), "worker shutting down; job dropped");
                    return None;
                }
                if !self.gate.is_enabled() {
                    tracing::debug!(
                        source = job.source(),
                        pending_aborts = self.gate.pending_aborts(),
                        "processing suspended; job dropped"
                    );
                    return None;
                }
                self.set_state(WorkerState::ProcessingJob);
                let outcome = self.runner.run_job(&job);
                self.set_state(WorkerState::Idle);
                Some(outcome)
            }
        }
    }

    /// Stop running jobs: the one in flight is interrupted and queued ones are
    /// dropped when reached. Aborts are still acknowledged.
    pub(crate) fn begin_drain(&self) {
        self.draining.store(true, Ordering::Release);
        self.runner.interrupt();
    }
}

//! Dedicated worker thread draining a FIFO inbox.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc::{self, UnboundedSender};

use super::{JobRunner, Request, WorkerCore, WorkerState};
use crate::job::{Job, JobRequest, RequestError};

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("worker has shut down")]
    ShutDown,
    #[error("invalid job request: {0}")]
    Request(#[from] RequestError),
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Owns the worker thread. Requests are dispatched on the caller's thread and
/// then queued, so the order of dispatch is the order of processing.
pub struct WorkerHandle<R: JobRunner> {
    core: Arc<WorkerCore<R>>,
    tx: Mutex<Option<UnboundedSender<Request>>>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl<R: JobRunner + 'static> WorkerHandle<R> {
    pub fn spawn(runner: Arc<R>) -> Result<Self, WorkerError> {
        let core = Arc::new(WorkerCore::new(runner));
        let (tx, mut rx) = mpsc::unbounded_channel::<Request>();
        let worker_core = Arc::clone(&core);
        let join = thread::Builder::new()
            .name("seqdl-worker".to_string())
            .spawn(move || {
                tracing::debug!("worker started");
                while let Some(request) = rx.blocking_recv() {
                    if let Some(outcome) = worker_core.process(request) {
                        tracing::debug!(%outcome, "job finished");
                    }
                }
                tracing::debug!("worker stopped");
            })
            .map_err(WorkerError::Spawn)?;
        Ok(Self {
            core,
            tx: Mutex::new(Some(tx)),
            join: Mutex::new(Some(join)),
        })
    }
}

impl<R: JobRunner> WorkerHandle<R> {
    pub fn runner(&self) -> &Arc<R> {
        self.core.runner()
    }

    pub fn state(&self) -> WorkerState {
        self.core.state()
    }

    pub fn pending_aborts(&self) -> usize {
        self.core.gate().pending_aborts()
    }

    pub fn is_enabled(&self) -> bool {
        self.core.gate().is_enabled()
    }

    pub fn submit(&self, job: Job) -> Result<(), WorkerError> {
        self.send(Request::Job(job))
    }

    pub fn submit_request(&self, request: JobRequest) -> Result<(), WorkerError> {
        self.submit(request.build()?)
    }

    /// Abort the job in flight and every job queued before this call.
    pub fn abort(&self) -> Result<(), WorkerError> {
        self.send(Request::Abort)
    }

    fn send(&self, request: Request) -> Result<(), WorkerError> {
        // Held across dispatch and send so concurrent submitters cannot
        // reorder the two steps against each other.
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = tx.as_ref() else {
            return Err(WorkerError::ShutDown);
        };
        self.core.dispatch(&request);
        let is_abort = matches!(request, Request::Abort);
        if sender.send(request).is_err() {
            if is_abort {
                self.core.gate().on_abort_signal_acknowledged();
            }
            return Err(WorkerError::ShutDown);
        }
        Ok(())
    }

    /// Stop the worker: interrupt the job in flight, drop queued jobs (queued
    /// aborts are still acknowledged) and join the thread. Idempotent.
    pub fn shutdown(&self) {
        self.core.begin_drain();
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let join = self
            .join
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(join) = join {
            if join.thread().id() == thread::current().id() {
                return;
            }
            if join.join().is_err() {
                tracing::error!("worker thread panicked");
            }
        }
    }
}

impl<R: JobRunner> Drop for WorkerHandle<R> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

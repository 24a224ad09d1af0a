//! Job runner: validate one job, run its transfer session to a terminal
//! outcome, and report start / progress / end to the listener.
//!
//! Validation order is fixed: destination (exists, directory, writable), then
//! source descriptor (exists, parses), then session construction. The first
//! failure becomes the job's outcome and no session is started.

mod progress;
mod validate;

pub use progress::ProgressCursor;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use crate::config::SeqdlConfig;
use crate::job::{locator_to_path, Job};
use crate::listener::SharedListener;
use crate::outcome::Outcome;
use crate::session::{DescriptorError, SessionObserver, TransferBackend};
use crate::waiter::CompletionWaiter;
use crate::worker::{JobRunner, Suspendable};

/// Runs jobs one at a time against a [`TransferBackend`].
pub struct Downloader<B: TransferBackend> {
    backend: B,
    listener: RwLock<SharedListener>,
    timeout_ms: AtomicU64,
    waiter: CompletionWaiter,
    /// Held for the whole of `download`; the waiter serves one session at a time.
    busy: Mutex<()>,
}

impl<B: TransferBackend> Downloader<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            listener: RwLock::new(None),
            timeout_ms: AtomicU64::new(0),
            waiter: CompletionWaiter::new(),
            busy: Mutex::new(()),
        }
    }

    pub fn with_config(backend: B, cfg: &SeqdlConfig) -> Self {
        let downloader = Self::new(backend);
        downloader.set_timeout_ms(cfg.timeout_ms);
        downloader
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Inactivity timeout applied to jobs started after this call; 0 = none.
    pub fn set_timeout_ms(&self, timeout_ms: u64) {
        self.timeout_ms.store(timeout_ms, Ordering::Relaxed);
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms.load(Ordering::Relaxed)
    }

    /// Replace the listener. A job in flight keeps the listener it started with.
    pub fn set_listener(&self, listener: SharedListener) {
        *self
            .listener
            .write()
            .unwrap_or_else(PoisonError::into_inner) = listener;
    }

    fn listener(&self) -> SharedListener {
        self.listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.waiter.set_enabled(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.waiter.is_enabled()
    }

    /// Run one job to its outcome. Reports exactly one start and one end.
    pub fn download(&self, job: &Job) -> Outcome {
        self.run(job.source(), Some(job.destination()))
    }

    /// Like [`Downloader::download`] for callers holding raw, possibly absent,
    /// locators. Without a source there is nothing to do: no callbacks fire and
    /// `None` is returned. A missing destination ends the job with
    /// `DestinationNotFound`.
    pub fn download_locators(
        &self,
        source: Option<&str>,
        destination: Option<&str>,
    ) -> Option<Outcome> {
        let source = source?;
        Some(self.run(source, destination))
    }

    fn run(&self, source: &str, destination: Option<&str>) -> Outcome {
        let _busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        let listener = self.listener();
        let timeout_ms = self.timeout_ms();

        tracing::info!(source, destination, timeout_ms, "download start");
        if let Some(l) = &listener {
            l.on_download_start(source);
        }

        let outcome = match self.execute(source, destination, &listener, timeout_ms) {
            Ok(outcome) | Err(outcome) => outcome,
        };

        tracing::info!(source, %outcome, "download end");
        if let Some(l) = &listener {
            l.on_download_end(source, outcome);
        }
        outcome
    }

    /// `Err` carries the outcome of a failed pre-flight check; `Ok` the
    /// waiter's verdict on a session that actually ran.
    fn execute(
        &self,
        source: &str,
        destination: Option<&str>,
        listener: &SharedListener,
        timeout_ms: u64,
    ) -> Result<Outcome, Outcome> {
        let destination = destination
            .map(locator_to_path)
            .ok_or(Outcome::DestinationNotFound)?;
        validate::check_destination(&destination)?;

        let descriptor = self
            .backend
            .load_descriptor(&locator_to_path(source))
            .map_err(|e| {
                tracing::debug!(source, "descriptor rejected: {}", e);
                match e {
                    DescriptorError::NotFound(_) => Outcome::SourceNotFound,
                    DescriptorError::Invalid { .. } => Outcome::SourceInvalid,
                }
            })?;

        let session = self
            .backend
            .open_session(descriptor, &destination)
            .map_err(|e| {
                tracing::warn!(source, "session create failed: {}", e);
                Outcome::SessionCreate
            })?;

        session.add_observer(progress_observer(source.to_string(), listener.clone()));
        session.start();
        let outcome = self
            .waiter
            .wait_for_completion_or_timeout(session.as_ref(), timeout_ms);
        session.stop();
        Ok(outcome)
    }
}

fn progress_observer(source: String, listener: SharedListener) -> SessionObserver {
    let mut cursor = ProgressCursor::new();
    Box::new(move |snapshot| {
        if let Some(p) = cursor.advance(snapshot.completion) {
            if let Some(l) = &listener {
                l.on_download_progress(&source, p);
            }
        }
    })
}

impl<B: TransferBackend> Suspendable for Downloader<B> {
    fn set_enabled(&self, enabled: bool) {
        Downloader::set_enabled(self, enabled);
    }
}

impl<B: TransferBackend> JobRunner for Downloader<B> {
    fn run_job(&self, job: &Job) -> Outcome {
        self.download(job)
    }

    fn interrupt(&self) {
        self.waiter.interrupt();
    }
}

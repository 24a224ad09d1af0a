//! Download manager: the worker, its event channel and the host's listener in
//! one handle.
//!
//! The worker reports through an [`EventBroadcaster`]; a forwarding thread
//! hands each event to whichever listener the host has set at that moment.

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

use crate::config::SeqdlConfig;
use crate::downloader::Downloader;
use crate::events::{dispatch_event, EventBroadcaster};
use crate::job::{Job, JobRequest};
use crate::listener::SharedListener;
use crate::session::local::LocalBackend;
use crate::session::TransferBackend;
use crate::worker::{WorkerError, WorkerHandle, WorkerState};

pub struct DownloadManager<B: TransferBackend + 'static> {
    worker: WorkerHandle<Downloader<B>>,
    listener: Arc<RwLock<SharedListener>>,
    forwarder: Mutex<Option<JoinHandle<()>>>,
}

impl DownloadManager<LocalBackend> {
    /// Manager over the built-in local backend, configured from `cfg`.
    pub fn local(cfg: &SeqdlConfig) -> Result<Self, WorkerError> {
        Self::start(Downloader::with_config(LocalBackend::from_config(cfg), cfg))
    }
}

impl<B: TransferBackend + 'static> DownloadManager<B> {
    /// Spawn the worker around `downloader`. Any listener already set on the
    /// downloader is replaced by the manager's broadcaster.
    pub fn start(downloader: Downloader<B>) -> Result<Self, WorkerError> {
        let (broadcaster, mut rx) = EventBroadcaster::channel();
        downloader.set_listener(Some(Arc::new(broadcaster)));

        let listener: Arc<RwLock<SharedListener>> = Arc::new(RwLock::new(None));
        let target = Arc::clone(&listener);
        let forwarder = thread::Builder::new()
            .name("seqdl-events".to_string())
            .spawn(move || {
                while let Some(event) = rx.blocking_recv() {
                    let current = target
                        .read()
                        .unwrap_or_else(PoisonError::into_inner)
                        .clone();
                    dispatch_event(&event, current.as_deref());
                }
            })
            .map_err(WorkerError::Spawn)?;

        let worker = WorkerHandle::spawn(Arc::new(downloader))?;
        Ok(Self {
            worker,
            listener,
            forwarder: Mutex::new(Some(forwarder)),
        })
    }

    pub fn enqueue(&self, request: JobRequest) -> Result<(), WorkerError> {
        self.worker.submit_request(request)
    }

    pub fn enqueue_job(&self, job: Job) -> Result<(), WorkerError> {
        self.worker.submit(job)
    }

    /// Abort the job in flight and every job enqueued before this call.
    pub fn abort(&self) -> Result<(), WorkerError> {
        self.worker.abort()
    }

    /// Listener for events delivered from now on; `None` drops them.
    pub fn set_listener(&self, listener: SharedListener) {
        *self
            .listener
            .write()
            .unwrap_or_else(PoisonError::into_inner) = listener;
    }

    pub fn set_timeout_ms(&self, timeout_ms: u64) {
        self.worker.runner().set_timeout_ms(timeout_ms);
    }

    pub fn state(&self) -> WorkerState {
        self.worker.state()
    }

    pub fn is_enabled(&self) -> bool {
        self.worker.is_enabled()
    }

    /// Stop the worker, then deliver every event it produced before returning.
    pub fn shutdown(&self) {
        self.worker.shutdown();
        // Dropping the broadcaster closes the channel; the forwarder drains
        // what is left and exits.
        self.worker.runner().set_listener(None);
        let forwarder = self
            .forwarder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(forwarder) = forwarder {
            if forwarder.thread().id() == thread::current().id() {
                return;
            }
            if forwarder.join().is_err() {
                tracing::error!("event forwarder panicked");
            }
        }
    }
}

impl<B: TransferBackend + 'static> Drop for DownloadManager<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

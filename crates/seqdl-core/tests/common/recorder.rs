//! Listener that records callbacks as events and lets tests wait for them.

use seqdl_core::events::DownloadEvent;
use seqdl_core::{DownloadListener, Outcome};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<DownloadEvent>>,
    changed: Condvar,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, event: DownloadEvent) {
        self.events.lock().unwrap().push(event);
        self.changed.notify_all();
    }

    pub fn events(&self) -> Vec<DownloadEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn ends(&self) -> Vec<(String, Outcome)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DownloadEvent::End { source, outcome } => Some((source, outcome)),
                DownloadEvent::Progress { .. } => None,
            })
            .collect()
    }

    /// Progress reports (excluding the start marker) for `source`.
    pub fn progress_of(&self, source: &str) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DownloadEvent::Progress { source: s, progress } if s == source && progress > 0 => {
                    Some(progress)
                }
                _ => None,
            })
            .collect()
    }

    /// Block until `n` jobs have ended. Panics after 10 seconds.
    pub fn wait_for_ends(&self, n: usize) -> Vec<(String, Outcome)> {
        let guard = self.events.lock().unwrap();
        let (guard, timeout) = self
            .changed
            .wait_timeout_while(guard, Duration::from_secs(10), |events| {
                events
                    .iter()
                    .filter(|e| matches!(e, DownloadEvent::End { .. }))
                    .count()
                    < n
            })
            .unwrap();
        assert!(!timeout.timed_out(), "timed out waiting for {n} job(s) to end");
        drop(guard);
        self.ends()
    }
}

impl DownloadListener for Recorder {
    fn on_download_start(&self, source: &str) {
        self.push(DownloadEvent::started(source).unwrap());
    }

    fn on_download_progress(&self, source: &str, progress: u8) {
        self.push(DownloadEvent::progress(source, progress).unwrap());
    }

    fn on_download_end(&self, source: &str, outcome: Outcome) {
        self.push(DownloadEvent::end(source, outcome).unwrap());
    }
}

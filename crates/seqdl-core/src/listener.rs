//! Listener protocol: the three callbacks a download reports through.

use std::sync::Arc;

use crate::outcome::Outcome;

/// Receives the lifecycle of each job. `source` is the job's source locator.
///
/// For every job with a source locator the runner calls `on_download_start`
/// once, `on_download_progress` zero or more times with strictly increasing
/// percentages, and `on_download_end` once.
pub trait DownloadListener: Send + Sync {
    fn on_download_start(&self, source: &str);

    fn on_download_progress(&self, source: &str, progress: u8);

    fn on_download_end(&self, source: &str, outcome: Outcome);
}

/// Shared optional listener. `None` drops every callback.
pub type SharedListener = Option<Arc<dyn DownloadListener>>;

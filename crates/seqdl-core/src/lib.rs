//! Sequential download coordination: one worker, one job at a time, abort
//! signals that suspend processing until acknowledged, and an inactivity
//! watchdog around each transfer session.

pub mod activity;
pub mod checksum;
pub mod config;
pub mod control;
pub mod downloader;
pub mod events;
pub mod gate;
pub mod job;
pub mod listener;
pub mod logging;
pub mod manager;
pub mod outcome;
pub mod session;
pub mod waiter;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

pub use job::{Job, JobRequest};
pub use listener::DownloadListener;
pub use outcome::Outcome;

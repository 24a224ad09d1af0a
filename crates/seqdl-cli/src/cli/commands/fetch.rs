//! `seqdl fetch <source> <destination>` – run one job in the foreground.

use anyhow::Result;
use seqdl_core::config::SeqdlConfig;
use seqdl_core::downloader::Downloader;
use seqdl_core::session::local::LocalBackend;
use seqdl_core::{JobRequest, Outcome};
use std::sync::Arc;

use crate::cli::printer::EventPrinter;

/// Runs the job on a blocking thread and fails unless it completed.
pub async fn run_fetch(
    cfg: &SeqdlConfig,
    source: &str,
    destination: &str,
    timeout_ms: Option<u64>,
    json: bool,
) -> Result<()> {
    let job = JobRequest::new()
        .source(source)
        .destination(destination)
        .build()?;
    let downloader = Downloader::with_config(LocalBackend::from_config(cfg), cfg);
    if let Some(timeout_ms) = timeout_ms {
        downloader.set_timeout_ms(timeout_ms);
    }
    downloader.set_listener(Some(Arc::new(EventPrinter::new(json))));

    let outcome = tokio::task::spawn_blocking(move || downloader.download(&job)).await?;
    if outcome != Outcome::Completed {
        anyhow::bail!("download of {} ended with {}", source, outcome);
    }
    Ok(())
}

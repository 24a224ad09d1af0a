//! `seqdl run` – host the worker and serve the control socket until shutdown.

use anyhow::Result;
use seqdl_core::config::SeqdlConfig;
use seqdl_core::manager::DownloadManager;
use std::path::Path;
use std::sync::Arc;

use crate::cli::control_socket;
use crate::cli::printer::EventPrinter;

pub async fn run_worker(
    cfg: &SeqdlConfig,
    socket: &Path,
    timeout_ms: Option<u64>,
    json: bool,
) -> Result<()> {
    let manager = Arc::new(DownloadManager::local(cfg)?);
    if let Some(timeout_ms) = timeout_ms {
        manager.set_timeout_ms(timeout_ms);
    }
    manager.set_listener(Some(Arc::new(EventPrinter::new(json))));

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::unbounded_channel::<()>();
    let server = control_socket::spawn_control_listener(Arc::clone(&manager), socket, shutdown_tx)?;
    tracing::info!(path = %socket.display(), "control socket listening");
    if !json {
        eprintln!("seqdl: listening on {}", socket.display());
    }

    tokio::select! {
        _ = shutdown_rx.recv() => tracing::info!("shutdown requested"),
        res = tokio::signal::ctrl_c() => {
            res?;
            tracing::info!("interrupted");
        }
    }

    server.abort();
    let _ = std::fs::remove_file(socket);
    // Joins the worker and event threads.
    tokio::task::spawn_blocking(move || manager.shutdown()).await?;
    Ok(())
}

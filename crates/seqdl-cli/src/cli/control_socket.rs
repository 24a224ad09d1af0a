//! Control socket: server (during `seqdl run`) and client (for `seqdl add`,
//! `seqdl abort`, `seqdl shutdown`).
//! Protocol: one JSON command per line, answered by one reply line.

use anyhow::{Context, Result};
use seqdl_core::control::{ControlCommand, REPLY_OK};
use seqdl_core::manager::DownloadManager;
use seqdl_core::session::TransferBackend;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc::UnboundedSender;

/// Binds `path` and spawns a task serving control connections. A `shutdown`
/// command is forwarded to `shutdown_tx`; everything else goes to `manager`.
pub fn spawn_control_listener<B: TransferBackend + 'static>(
    manager: Arc<DownloadManager<B>>,
    path: impl AsRef<Path>,
    shutdown_tx: UnboundedSender<()>,
) -> Result<tokio::task::JoinHandle<()>> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create socket dir {}", parent.display()))?;
    }
    let _ = std::fs::remove_file(path);
    let listener = UnixListener::bind(path)
        .with_context(|| format!("bind control socket {}", path.display()))?;

    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let manager = Arc::clone(&manager);
                    let shutdown_tx = shutdown_tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, &*manager, &shutdown_tx).await {
                            tracing::debug!("control connection: {:#}", e);
                        }
                    });
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            }
        }
    });
    Ok(handle)
}

async fn serve_connection<B: TransferBackend + 'static>(
    stream: UnixStream,
    manager: &DownloadManager<B>,
    shutdown_tx: &UnboundedSender<()>,
) -> Result<()> {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    while let Some(line) = lines.next_line().await? {
        let reply = handle_line(&line, manager, shutdown_tx);
        write.write_all(reply.as_bytes()).await?;
        write.write_all(b"\n").await?;
    }
    Ok(())
}

/// Apply one control line and return the reply (without newline).
pub(crate) fn handle_line<B: TransferBackend + 'static>(
    line: &str,
    manager: &DownloadManager<B>,
    shutdown_tx: &UnboundedSender<()>,
) -> String {
    let cmd = match ControlCommand::parse(line) {
        Ok(cmd) => cmd,
        Err(e) => {
            tracing::debug!(line, "ignoring control line: {}", e);
            return format!("error: {e}");
        }
    };
    tracing::debug!(?cmd, "control command");
    let result = match &cmd {
        ControlCommand::Add { .. } => match cmd.to_job() {
            Ok(Some(job)) => manager.enqueue_job(job).map_err(anyhow::Error::from),
            Ok(None) => Ok(()),
            Err(e) => Err(e.into()),
        },
        ControlCommand::Abort => manager.abort().map_err(anyhow::Error::from),
        ControlCommand::Shutdown => shutdown_tx
            .send(())
            .map_err(|_| anyhow::anyhow!("already shutting down")),
    };
    match result {
        Ok(()) => REPLY_OK.to_string(),
        Err(e) => format!("error: {e:#}"),
    }
}

/// Sends one command to a running `seqdl run` and waits for its reply.
pub async fn send_command(socket_path: &Path, cmd: &ControlCommand) -> Result<()> {
    let stream = UnixStream::connect(socket_path).await.with_context(|| {
        format!(
            "connect to {} (is `seqdl run` running?)",
            socket_path.display()
        )
    })?;
    let (read, mut write) = stream.into_split();
    write.write_all(cmd.to_line()?.as_bytes()).await?;
    write.shutdown().await?;

    let reply = BufReader::new(read)
        .lines()
        .next_line()
        .await?
        .context("control socket closed without a reply")?;
    if reply == REPLY_OK {
        Ok(())
    } else {
        anyhow::bail!("{}", reply)
    }
}

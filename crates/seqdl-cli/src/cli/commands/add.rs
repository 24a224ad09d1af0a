//! `seqdl add <source> <destination>` – queue a job on a running worker.

use anyhow::Result;
use seqdl_core::control::ControlCommand;
use std::path::Path;

use crate::cli::control_socket;

pub async fn run_add(socket: &Path, source: &str, destination: &str) -> Result<()> {
    let cmd = ControlCommand::add(source, destination);
    // Validate locally so a blank locator never reaches the server.
    cmd.to_job()?;
    control_socket::send_command(socket, &cmd).await?;
    println!("Queued {source}");
    Ok(())
}

//! `seqdl abort` – abort the running job and everything queued before it.

use anyhow::Result;
use seqdl_core::control::ControlCommand;
use std::path::Path;

use crate::cli::control_socket;

pub async fn run_abort(socket: &Path) -> Result<()> {
    control_socket::send_command(socket, &ControlCommand::Abort).await?;
    println!("Abort requested");
    Ok(())
}

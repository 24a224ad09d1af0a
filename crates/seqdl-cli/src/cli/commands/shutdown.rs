//! `seqdl shutdown` – stop a running `seqdl run`.

use anyhow::Result;
use seqdl_core::control::ControlCommand;
use std::path::Path;

use crate::cli::control_socket;

pub async fn run_shutdown(socket: &Path) -> Result<()> {
    control_socket::send_command(socket, &ControlCommand::Shutdown).await?;
    println!("Shutdown requested");
    Ok(())
}

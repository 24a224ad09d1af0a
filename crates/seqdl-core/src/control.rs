//! Control protocol between a running `seqdl run` instance and its clients.
//!
//! One JSON object per line, tagged by `command`:
//! `{"command":"add","source":"/srv/a.toml","destination":"/tmp"}`,
//! `{"command":"abort"}`, `{"command":"shutdown"}`.
//! The server answers each line with `ok` or `error: <reason>`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::job::{Job, JobRequest, RequestError};

pub const REPLY_OK: &str = "ok";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ControlCommand {
    /// Queue a job behind everything already submitted.
    Add { source: String, destination: String },
    /// Abort the job in flight and every job queued before this command.
    Abort,
    /// Stop the worker and exit the server.
    Shutdown,
}

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("empty control line")]
    Empty,
    #[error("malformed control line: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Request(#[from] RequestError),
}

impl ControlCommand {
    pub fn add(source: impl Into<String>, destination: impl Into<String>) -> Self {
        ControlCommand::Add {
            source: source.into(),
            destination: destination.into(),
        }
    }

    pub fn parse(line: &str) -> Result<Self, ControlError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ControlError::Empty);
        }
        let cmd: ControlCommand = serde_json::from_str(line)?;
        if let ControlCommand::Add { .. } = &cmd {
            cmd.to_job()?;
        }
        Ok(cmd)
    }

    /// Serialized form, newline included.
    pub fn to_line(&self) -> Result<String, ControlError> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    /// The job an `add` describes; `None` for the other commands.
    pub fn to_job(&self) -> Result<Option<Job>, RequestError> {
        match self {
            ControlCommand::Add {
                source,
                destination,
            } => JobRequest::new()
                .source(source.as_str())
                .destination(destination.as_str())
                .build()
                .map(Some),
            ControlCommand::Abort | ControlCommand::Shutdown => Ok(None),
        }
    }
}

/// Default path for the control socket, under the XDG state dir.
pub fn default_control_socket_path() -> std::io::Result<PathBuf> {
    let dir = xdg::BaseDirectories::with_prefix("seqdl")?.get_state_home();
    Ok(dir.join("control.sock"))
}

//! CLI for the seqdl sequential download worker.

mod commands;
mod control_socket;
mod printer;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use seqdl_core::config::{self, SeqdlConfig};
use seqdl_core::control::default_control_socket_path;
use std::path::{Path, PathBuf};

use commands::{
    run_abort, run_add, run_checksum, run_describe, run_fetch, run_shutdown, run_worker,
};

/// Top-level CLI for the seqdl download worker.
#[derive(Debug, Parser)]
#[command(name = "seqdl")]
#[command(about = "seqdl: sequential download worker with abortable queue", long_about = None)]
pub struct Cli {
    /// Config file to use instead of `~/.config/seqdl/config.toml`.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the worker and serve the control socket until `seqdl shutdown`.
    Run {
        /// Inactivity timeout per job in milliseconds (0 = none). Overrides the config.
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
        /// Print events as JSON lines.
        #[arg(long)]
        json: bool,
        /// Control socket path (default: XDG state dir).
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Queue a job on a running worker.
    Add {
        /// Descriptor path or file:// URL.
        source: String,
        /// Directory the payload is written to.
        destination: String,
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Abort the running job and every job queued before this command.
    Abort {
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Stop a running worker.
    Shutdown {
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Run a single job in the foreground.
    Fetch {
        /// Descriptor path or file:// URL.
        source: String,
        /// Directory the payload is written to.
        destination: String,
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
        #[arg(long)]
        json: bool,
    },

    /// Write a transfer descriptor for a local file.
    Describe {
        /// Payload file.
        payload: PathBuf,
        /// File name to create in the destination (default: payload's name).
        #[arg(long)]
        name: Option<String>,
        /// Output path (default: stdout).
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Compute SHA-256 of a file.
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },
}

fn socket_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => default_control_socket_path().context("resolve control socket path"),
    }
}

fn load_config(explicit: Option<&Path>) -> Result<SeqdlConfig> {
    match explicit {
        Some(path) => config::load_from_path(path),
        None => config::load_or_init(),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = load_config(cli.config.as_deref())?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run {
                timeout_ms,
                json,
                socket,
            } => run_worker(&cfg, &socket_path(socket)?, timeout_ms, json).await?,
            CliCommand::Add {
                source,
                destination,
                socket,
            } => run_add(&socket_path(socket)?, &source, &destination).await?,
            CliCommand::Abort { socket } => run_abort(&socket_path(socket)?).await?,
            CliCommand::Shutdown { socket } => run_shutdown(&socket_path(socket)?).await?,
            CliCommand::Fetch {
                source,
                destination,
                timeout_ms,
                json,
            } => run_fetch(&cfg, &source, &destination, timeout_ms, json).await?,
            CliCommand::Describe {
                payload,
                name,
                output,
            } => run_describe(&payload, name.as_deref(), output.as_deref()).await?,
            CliCommand::Checksum { path } => run_checksum(&path).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;

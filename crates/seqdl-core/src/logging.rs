//! Tracing setup for the engine.
//!
//! Worker flow (job finished, job dropped while suspended, drain on shutdown)
//! logs at `debug`, as do abort counts on the gate and the local copy thread.
//! Job start and end log at `info`. A stray acknowledgment or a failed session
//! logs at `warn`. `RUST_LOG` overrides the default filter.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,seqdl=debug";
const LOG_FILE: &str = "seqdl.log";

/// `$XDG_STATE_HOME/seqdl/seqdl.log`.
pub fn log_path() -> Result<PathBuf> {
    let dirs = xdg::BaseDirectories::with_prefix("seqdl")?;
    Ok(dirs.get_state_home().join(LOG_FILE))
}

/// Hands each event a clone of the shared log file. If the clone fails the
/// line still goes somewhere, on stderr.
struct SharedLogFile(File);

enum LogSink {
    File(File),
    Stderr(io::Stderr),
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogSink::File(f) => f.write(buf),
            LogSink::Stderr(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::File(f) => f.flush(),
            LogSink::Stderr(e) => e.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for SharedLogFile {
    type Writer = LogSink;

    fn make_writer(&'a self) -> LogSink {
        match self.0.try_clone() {
            Ok(file) => LogSink::File(file),
            Err(_) => LogSink::Stderr(io::stderr()),
        }
    }
}

/// Append the worker's log to [`log_path`]. Errors (no state dir, unwritable
/// file) are returned so the binary can fall back to [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    let path = log_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(BoxMakeWriter::new(SharedLogFile(file)))
        .with_ansi(false)
        .init();

    tracing::info!(path = %path.display(), "seqdl logging started");
    Ok(())
}

/// Log to stderr; used by foreground commands and when the log file is
/// unavailable.
pub fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

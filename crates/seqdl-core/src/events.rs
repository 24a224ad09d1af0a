//! Listener protocol as messages, for hosts that observe the worker from
//! another thread or process.
//!
//! Only two event kinds exist: a progress value of 0 stands for "started".
//! [`dispatch_event`] turns events back into listener calls on the receiving
//! side.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::listener::DownloadListener;
use crate::outcome::Outcome;

/// On the wire an end event carries the outcome's name and its integer code;
/// decoding goes by the code and rejects a name that disagrees with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireEvent", try_from = "WireEvent")]
pub enum DownloadEvent {
    Progress { source: String, progress: u8 },
    End { source: String, outcome: Outcome },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EventError {
    #[error("event has an empty source")]
    EmptySource,
    #[error("progress {0} is outside 0..=100")]
    ProgressOutOfRange(u8),
    #[error("unknown outcome code {0}")]
    UnknownCode(i32),
    #[error("outcome {name} does not match code {code}")]
    CodeMismatch { name: Outcome, code: i32 },
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum WireEvent {
    Progress {
        source: String,
        progress: u8,
    },
    End {
        source: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        outcome: Option<Outcome>,
        code: i32,
    },
}

impl From<DownloadEvent> for WireEvent {
    fn from(event: DownloadEvent) -> Self {
        match event {
            DownloadEvent::Progress { source, progress } => WireEvent::Progress { source, progress },
            DownloadEvent::End { source, outcome } => WireEvent::End {
                source,
                outcome: Some(outcome),
                code: outcome.code(),
            },
        }
    }
}

impl TryFrom<WireEvent> for DownloadEvent {
    type Error = EventError;

    fn try_from(wire: WireEvent) -> Result<Self, EventError> {
        match wire {
            WireEvent::Progress { source, progress } => DownloadEvent::progress(source, progress),
            WireEvent::End {
                source,
                outcome,
                code,
            } => {
                let by_code = Outcome::from_code(code).ok_or(EventError::UnknownCode(code))?;
                if let Some(name) = outcome.filter(|name| *name != by_code) {
                    return Err(EventError::CodeMismatch { name, code });
                }
                DownloadEvent::end(source, by_code)
            }
        }
    }
}

impl DownloadEvent {
    pub fn started(source: impl Into<String>) -> Result<Self, EventError> {
        Self::progress(source, 0)
    }

    pub fn progress(source: impl Into<String>, progress: u8) -> Result<Self, EventError> {
        if progress > 100 {
            return Err(EventError::ProgressOutOfRange(progress));
        }
        Ok(DownloadEvent::Progress {
            source: non_empty(source.into())?,
            progress,
        })
    }

    pub fn end(source: impl Into<String>, outcome: Outcome) -> Result<Self, EventError> {
        Ok(DownloadEvent::End {
            source: non_empty(source.into())?,
            outcome,
        })
    }

    /// Parse one JSON line produced by [`DownloadEvent::to_json_line`].
    pub fn from_json_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line.trim())
    }

    pub fn source(&self) -> &str {
        match self {
            DownloadEvent::Progress { source, .. } | DownloadEvent::End { source, .. } => source,
        }
    }

    /// One JSON object, no trailing newline.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn non_empty(source: String) -> Result<String, EventError> {
    if source.is_empty() {
        return Err(EventError::EmptySource);
    }
    Ok(source)
}

/// Deliver one event to `listener`. Events with no listener set are dropped.
pub fn dispatch_event(event: &DownloadEvent, listener: Option<&dyn DownloadListener>) {
    let Some(listener) = listener else {
        return;
    };
    match event {
        DownloadEvent::Progress {
            source,
            progress: 0,
        } => listener.on_download_start(source),
        DownloadEvent::Progress { source, progress } => {
            listener.on_download_progress(source, *progress)
        }
        DownloadEvent::End { source, outcome } => listener.on_download_end(source, *outcome),
    }
}

/// Listener that turns callbacks into [`DownloadEvent`]s on a channel.
///
/// Sending never blocks the worker; once the receiver is gone events are
/// discarded.
pub struct EventBroadcaster {
    tx: UnboundedSender<DownloadEvent>,
}

impl EventBroadcaster {
    pub fn channel() -> (Self, UnboundedReceiver<DownloadEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: Result<DownloadEvent, EventError>) {
        match event {
            Ok(event) => {
                if self.tx.send(event).is_err() {
                    tracing::trace!("event receiver closed; event dropped");
                }
            }
            Err(e) => tracing::warn!("event not sent: {}", e),
        }
    }
}

impl DownloadListener for EventBroadcaster {
    fn on_download_start(&self, source: &str) {
        self.emit(DownloadEvent::started(source));
    }

    fn on_download_progress(&self, source: &str, progress: u8) {
        // 0 is reserved for "started"; a progress report always means more.
        if progress == 0 {
            return;
        }
        self.emit(DownloadEvent::progress(source, progress));
    }

    fn on_download_end(&self, source: &str, outcome: Outcome) {
        self.emit(DownloadEvent::end(source, outcome));
    }
}

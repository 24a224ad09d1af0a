//! Transfer sessions: the engine-facing capability that moves bytes.
//!
//! The coordination engine never looks inside a transfer. It only starts a
//! session, observes its lifecycle state and fractional completion, and stops
//! it. A [`TransferBackend`] turns a source descriptor into a session.

pub mod descriptor;
pub mod local;

use std::path::{Path, PathBuf};

/// Lifecycle state of a transfer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created or started, nothing transferred yet.
    Waiting,
    /// Checking data already on disk.
    Validating,
    /// Actively transferring.
    Running,
    Done,
    Error,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Done | SessionState::Error)
    }
}

/// What an observer sees on each session notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    /// Completion in percent, 0.0..=100.0.
    pub completion: f32,
}

/// Callback fired on every internal state change of a session.
pub type SessionObserver = Box<dyn FnMut(&SessionSnapshot) + Send>;

/// One in-progress transfer.
///
/// `state` and `completion` must not block on observer dispatch: the
/// completion waiter reads them while holding its own lock, and observers take
/// that same lock.
pub trait TransferSession: Send + Sync {
    /// Begin transferring in the background. Returns immediately.
    fn start(&self);

    fn state(&self) -> SessionState;

    fn completion(&self) -> f32;

    fn add_observer(&self, observer: SessionObserver);

    /// Ask the transfer to stop. Cooperative; safe to call more than once.
    fn stop(&self);
}

/// Why a source descriptor could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("descriptor not found: {0}")]
    NotFound(PathBuf),
    #[error("invalid descriptor {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Why a session could not be constructed.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("payload unavailable: {0}")]
    Payload(#[source] std::io::Error),
    #[error("cannot prepare {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Other(String),
}

/// Factory for sessions of one transfer kind.
pub trait TransferBackend: Send + Sync {
    type Descriptor;

    /// Load and parse the descriptor at `path`. A missing file must map to
    /// [`DescriptorError::NotFound`].
    fn load_descriptor(&self, path: &Path) -> Result<Self::Descriptor, DescriptorError>;

    /// Construct (but do not start) a session writing into `destination`.
    fn open_session(
        &self,
        descriptor: Self::Descriptor,
        destination: &Path,
    ) -> Result<Box<dyn TransferSession>, SessionError>;
}

//! Download jobs and the request builder that creates them.

use std::path::PathBuf;

/// Error returned when a download request is incomplete. Such requests never
/// enter the worker's inbox.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("source locator must not be empty")]
    MissingSource,
    #[error("destination directory must not be empty")]
    MissingDestination,
}

/// One immutable download job: a transfer descriptor and the directory the
/// payload is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    source: String,
    destination: String,
}

impl Job {
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
    ) -> Result<Self, RequestError> {
        JobRequest::new().source(source).destination(destination).build()
    }

    /// Source locator exactly as submitted; used as the job's identity in
    /// listener callbacks.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }
}

/// Builder for a [`Job`]. Both fields are required.
#[derive(Debug, Clone, Default)]
pub struct JobRequest {
    source: Option<String>,
    destination: Option<String>,
}

impl JobRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn build(self) -> Result<Job, RequestError> {
        let source = self
            .source
            .filter(|s| !s.trim().is_empty())
            .ok_or(RequestError::MissingSource)?;
        let destination = self
            .destination
            .filter(|d| !d.trim().is_empty())
            .ok_or(RequestError::MissingDestination)?;
        Ok(Job {
            source,
            destination,
        })
    }
}

/// Maps a locator to a filesystem path. `file://` URLs are decoded; anything
/// else is taken as a path as-is.
pub fn locator_to_path(locator: &str) -> PathBuf {
    if locator.starts_with("file://") {
        if let Ok(path) = url::Url::parse(locator)
            .map_err(|_| ())
            .and_then(|u| u.to_file_path())
        {
            return path;
        }
    }
    PathBuf::from(locator)
}

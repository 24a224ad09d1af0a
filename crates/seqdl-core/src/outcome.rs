//! Terminal classification of a job.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exactly one `Outcome` is reported per job, always through `on_download_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Completed,
    Aborted,
    TimedOut,
    /// The transfer session itself reported an error.
    Error,
    SourceNotFound,
    SourceInvalid,
    DestinationNotFound,
    DestinationNotADirectory,
    DestinationNotWritable,
    SessionCreate,
}

impl Outcome {
    pub const ALL: [Outcome; 10] = [
        Outcome::Completed,
        Outcome::Aborted,
        Outcome::TimedOut,
        Outcome::Error,
        Outcome::SourceNotFound,
        Outcome::SourceInvalid,
        Outcome::DestinationNotFound,
        Outcome::DestinationNotADirectory,
        Outcome::DestinationNotWritable,
        Outcome::SessionCreate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Completed => "completed",
            Outcome::Aborted => "aborted",
            Outcome::TimedOut => "timed_out",
            Outcome::Error => "error",
            Outcome::SourceNotFound => "source_not_found",
            Outcome::SourceInvalid => "source_invalid",
            Outcome::DestinationNotFound => "destination_not_found",
            Outcome::DestinationNotADirectory => "destination_not_a_directory",
            Outcome::DestinationNotWritable => "destination_not_writable",
            Outcome::SessionCreate => "session_create",
        }
    }

    /// Stable integer code used on the event wire form.
    pub fn code(self) -> i32 {
        match self {
            Outcome::Completed => 0,
            Outcome::Aborted => 1,
            Outcome::TimedOut => 2,
            Outcome::Error => 100,
            Outcome::SourceNotFound => 101,
            Outcome::SourceInvalid => 102,
            Outcome::DestinationNotFound => 103,
            Outcome::DestinationNotADirectory => 104,
            Outcome::DestinationNotWritable => 105,
            Outcome::SessionCreate => 106,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.code() == code)
    }

    /// True for every outcome except `Completed`, `Aborted` and `TimedOut`.
    pub fn is_error(self) -> bool {
        !matches!(
            self,
            Outcome::Completed | Outcome::Aborted | Outcome::TimedOut
        )
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

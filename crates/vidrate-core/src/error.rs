//! Session error types.
//!
//! These errors are returned by the session controller and its collaborators.
//! Only `InvalidTesterId`, `IncompleteRating` and `InvalidTransition` ever
//! reach the front-end as failures; the I/O variants are degraded to notices
//! by the session runner.

use std::path::PathBuf;

use thiserror::Error;

use crate::controller::SessionState;
use crate::model::RatingAxis;

/// Errors that can occur while driving a rating session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The tester id was not a positive integer.
    #[error("invalid tester id: {0:?}")]
    InvalidTesterId(String),

    /// A playlist manifest was missing or unreadable.
    #[error("failed to load playlist '{reference}' from {}", .path.display())]
    PlaylistLoad {
        reference: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Not every rating group had a selection.
    #[error("incomplete rating, missing: {}", format_axes(.missing))]
    IncompleteRating { missing: Vec<RatingAxis> },

    /// The ratings log could not be written.
    #[error("failed to write ratings log {}", .path.display())]
    SinkWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ratings log could not be copied to the export location.
    #[error("failed to export ratings log to {}", .path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Persisted session state could not be read or written.
    #[error("session state error at {}: {message}", .path.display())]
    StateStore { path: PathBuf, message: String },

    /// An operation was invoked from a state that does not allow it.
    #[error("cannot {operation} while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: SessionState,
    },
}

impl SessionError {
    /// Returns `true` if the session can carry on after this error.
    ///
    /// I/O failures on the log, the export or the state file are accepted
    /// data-loss risks; the session keeps going.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SessionError::PlaylistLoad { .. }
                | SessionError::SinkWrite { .. }
                | SessionError::Export { .. }
                | SessionError::StateStore { .. }
        )
    }
}

fn format_axes(axes: &[RatingAxis]) -> String {
    axes.iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type SessionResult<T> = Result<T, SessionError>;

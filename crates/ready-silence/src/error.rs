//! Error types for the ready-silence crate.

use ready_exec::ExecError;
use thiserror::Error;

/// Errors that can occur while managing silences.
#[derive(Debug, Error)]
pub enum SilenceError {
    /// The silence could not be built.
    #[error("invalid silence: {reason}")]
    InvalidSilence {
        /// The reason the silence is invalid.
        reason: String,
    },

    /// The call to the silence store could not be made.
    #[error("silence store transport error: {0}")]
    Transport(#[from] ExecError),

    /// The store answered with an unexpected HTTP status.
    #[error("silence store returned HTTP {status}: {body}")]
    UnexpectedStatus {
        /// The HTTP status code.
        status: u16,
        /// The response body.
        body: String,
    },

    /// The store has no silence with this ID.
    #[error("silence not found: {id}")]
    NotFound {
        /// The silence ID that was not found.
        id: String,
    },

    /// The store answered with something that is not the expected JSON.
    #[error("malformed silence store response: {reason}")]
    MalformedResponse {
        /// What could not be parsed.
        reason: String,
    },

    /// Listing silences kept failing.
    #[error("silence store unavailable after {attempts} attempts: {reason}")]
    StoreUnavailable {
        /// Number of attempts made.
        attempts: u32,
        /// The last failure.
        reason: String,
    },

    /// An owned silence could not be removed.
    #[error("failed to remove silence {id} after {attempts} attempts: {reason}")]
    RemovalFailed {
        /// The silence that is still in place.
        id: String,
        /// Number of attempts made.
        attempts: u32,
        /// The last failure.
        reason: String,
    },
}

impl SilenceError {
    /// Whether retrying the same store call could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_transient(),
            Self::UnexpectedStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for SilenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse {
            reason: err.to_string(),
        }
    }
}

/// Result type for silence operations.
pub type Result<T> = std::result::Result<T, SilenceError>;

//! Error types for the readiness job.

use ready_exec::ExecError;
use ready_health::HealthError;
use ready_silence::SilenceError;
use thiserror::Error;

use crate::birth::BirthError;

/// Errors that end the readiness job.
#[derive(Debug, Error)]
pub enum JobError {
    /// Pod coordinates or the `oc` path are unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ExecError),

    /// The cluster creation time could not be determined.
    #[error("cluster creation time unavailable after {attempts} attempts: {reason}")]
    BirthUnavailable {
        /// Number of attempts made.
        attempts: u32,
        /// The last failure.
        reason: String,
    },

    /// The time source answered with something unusable.
    #[error(transparent)]
    Birth(#[from] BirthError),

    /// Managing the silence failed.
    #[error(transparent)]
    Silence(#[from] SilenceError),

    /// A health probe could not be evaluated.
    #[error(transparent)]
    Health(#[from] HealthError),
}

/// Result type for the readiness job.
pub type Result<T> = std::result::Result<T, JobError>;

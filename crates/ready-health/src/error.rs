//! Error types for the ready-health crate.

use thiserror::Error;

/// Errors that can occur while verifying cluster health.
#[derive(Debug, Error)]
pub enum HealthError {
    /// A probe could not run or its result could not be evaluated.
    #[error("health probe {run} could not be evaluated: {reason}")]
    ProbeError {
        /// Which probe of the pass errored (1-based).
        run: u32,
        /// What went wrong.
        reason: String,
    },
}

/// Result type for health verification.
pub type Result<T> = std::result::Result<T, HealthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = HealthError::ProbeError {
            run: 2,
            reason: "oc: connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "health probe 2 could not be evaluated: oc: connection refused"
        );
    }
}

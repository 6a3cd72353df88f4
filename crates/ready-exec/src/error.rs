//! Error types for the execution channel.

use thiserror::Error;

/// Result type alias for execution channel operations.
pub type Result<T> = std::result::Result<T, ExecError>;

/// Errors that can occur while running commands through the execution channel.
#[derive(Debug, Error)]
pub enum ExecError {
    /// A command argument or pod coordinate failed validation.
    #[error("invalid {field}: {reason}")]
    InvalidArgument {
        /// The field that failed validation.
        field: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The program could not be started.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The command returned a non-zero exit code.
    #[error("command '{command}' exited with code {exit_code}: {stderr}")]
    NonZeroExit {
        /// The command that was executed.
        command: String,
        /// The exit code.
        exit_code: i32,
        /// Standard error output.
        stderr: String,
    },

    /// The command succeeded but its output could not be interpreted.
    #[error("malformed command output: {reason}")]
    MalformedOutput {
        /// What was wrong with the output.
        reason: String,
    },
}

impl ExecError {
    /// Create an invalid argument error.
    #[must_use]
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a non-zero exit error.
    #[must_use]
    pub fn non_zero_exit(
        command: impl Into<String>,
        exit_code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        Self::NonZeroExit {
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Create a malformed output error.
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedOutput {
            reason: reason.into(),
        }
    }

    /// Whether retrying the same call could succeed.
    ///
    /// Spawn failures and non-zero exits are what an unready pod or API
    /// server looks like from the outside; bad arguments and unparseable
    /// output will not fix themselves.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Spawn { .. } | Self::NonZeroExit { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_invalid_argument() {
        let err = ExecError::invalid("namespace", "cannot be empty");
        assert_eq!(err.to_string(), "invalid namespace: cannot be empty");
    }

    #[test]
    fn error_display_non_zero_exit() {
        let err = ExecError::non_zero_exit("oc exec", 1, "pod not found");
        assert_eq!(
            err.to_string(),
            "command 'oc exec' exited with code 1: pod not found"
        );
    }

    #[test]
    fn transient_classification() {
        assert!(ExecError::non_zero_exit("oc", 1, "").is_transient());
        assert!(
            ExecError::Spawn {
                program: "oc".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            }
            .is_transient()
        );
        assert!(!ExecError::invalid("pod", "bad").is_transient());
        assert!(!ExecError::malformed("no status line").is_transient());
    }
}

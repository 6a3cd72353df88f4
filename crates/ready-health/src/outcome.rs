//! Result of a single health probe.

/// What one probe of the cluster reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthOutcome {
    /// Every check passed.
    Success,
    /// The checks ran and at least one failed. Carries one line per failure.
    Failure(Vec<String>),
    /// The checks could not be run or evaluated.
    Error(String),
}

impl HealthOutcome {
    /// Returns true for [`HealthOutcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns the outcome as a short label for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure(_) => "failure",
            Self::Error(_) => "error",
        }
    }
}

impl std::fmt::Display for HealthOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

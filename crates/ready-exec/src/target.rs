//! Pod coordinates for `oc exec`.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ExecError, Result};

/// Kubernetes object names: lowercase DNS-1123 subdomains.
#[allow(clippy::expect_used)]
static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("static regex is valid")
});

const MAX_NAME_LENGTH: usize = 253;

fn validate_name(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ExecError::invalid(field, "cannot be empty"));
    }
    if value.len() > MAX_NAME_LENGTH {
        return Err(ExecError::invalid(
            field,
            format!("exceeds {MAX_NAME_LENGTH} characters"),
        ));
    }
    if !NAME_RE.is_match(value) {
        return Err(ExecError::invalid(
            field,
            format!("'{value}' is not a valid DNS-1123 name"),
        ));
    }
    Ok(())
}

/// A container inside a pod, addressed by namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodTarget {
    namespace: String,
    pod: String,
    container: String,
}

impl PodTarget {
    /// Create a validated pod target.
    ///
    /// # Errors
    ///
    /// Returns `ExecError::InvalidArgument` if any coordinate is not a valid
    /// Kubernetes name.
    pub fn new(
        namespace: impl Into<String>,
        pod: impl Into<String>,
        container: impl Into<String>,
    ) -> Result<Self> {
        let target = Self {
            namespace: namespace.into(),
            pod: pod.into(),
            container: container.into(),
        };
        validate_name("namespace", &target.namespace)?;
        validate_name("pod", &target.pod)?;
        validate_name("container", &target.container)?;
        Ok(target)
    }

    /// The namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The pod name.
    #[must_use]
    pub fn pod(&self) -> &str {
        &self.pod
    }

    /// The container name.
    #[must_use]
    pub fn container(&self) -> &str {
        &self.container
    }
}

impl fmt::Display for PodTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.namespace, self.pod, self.container)
    }
}

//! Cluster health verification for the readiness job.
//!
//! A cluster counts as healthy only after a number of consecutive clean probe
//! runs. A single failed run ends the pass, and a probe that cannot be
//! evaluated at all is reported as an error rather than as unhealthy.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod outcome;
pub mod probe;
pub mod verifier;

/// Scripted probe for tests (requires the `test-helpers` feature).
#[cfg(any(test, feature = "test-helpers"))]
pub mod fake;

pub use error::{HealthError, Result};
pub use outcome::HealthOutcome;
pub use probe::{ClusterOperatorProbe, HealthProbe, evaluate_cluster_operators};
pub use verifier::HealthVerifier;

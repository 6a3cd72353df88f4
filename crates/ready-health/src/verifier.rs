//! Consecutive-run health verification.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{HealthError, Result};
use crate::outcome::HealthOutcome;
use crate::probe::HealthProbe;

/// Runs a [`HealthProbe`] until it has passed enough times in a row.
#[derive(Debug, Clone)]
pub struct HealthVerifier<P> {
    probe: P,
}

impl<P: HealthProbe> HealthVerifier<P> {
    /// Creates a verifier around a probe.
    #[must_use]
    pub const fn new(probe: P) -> Self {
        Self { probe }
    }

    /// Returns the underlying probe.
    #[must_use]
    pub const fn probe(&self) -> &P {
        &self.probe
    }

    /// Probe until `required_runs` consecutive successes, `interval` apart.
    ///
    /// The first failed probe ends the pass with `Ok(false)`; there is no
    /// partial credit and every call counts from zero. A `required_runs` of 0
    /// still probes once.
    ///
    /// # Errors
    ///
    /// Returns `HealthError::ProbeError` as soon as a probe cannot be
    /// evaluated. No further probes are run.
    pub async fn is_healthy(&self, required_runs: u32, interval: Duration) -> Result<bool> {
        let required_runs = required_runs.max(1);
        let mut clean_runs = 0;

        loop {
            let run = clean_runs + 1;
            match self.probe.probe().await {
                HealthOutcome::Error(reason) => {
                    warn!(run, error = %reason, "health probe errored");
                    return Err(HealthError::ProbeError { run, reason });
                }
                HealthOutcome::Failure(details) => {
                    for detail in &details {
                        warn!(run, detail = %detail, "health check failed");
                    }
                    info!(run, failures = details.len(), "health check pass failed");
                    return Ok(false);
                }
                HealthOutcome::Success => {
                    clean_runs = run;
                    info!(clean_runs, required_runs, "clean health check run");
                    if clean_runs >= required_runs {
                        return Ok(true);
                    }
                }
            }
            sleep(interval).await;
        }
    }
}

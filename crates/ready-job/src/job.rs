//! The readiness control loop.
//!
//! Each iteration runs strictly in order:
//!
//! 1. Check the cluster's age. Too old: remove our silence if we can and stop.
//! 2. Make sure an owned silence covers the next health check pass.
//! 3. Run a health check pass.
//! 4. Healthy: remove the silence and stop. Otherwise wait and start over.
//!
//! The silence chosen in step 2 is carried into the next iteration, so a
//! replacement created by this run is reused rather than replaced again.
//! On exit the job removes that silence and any it replaced along the way.
//! Other owned duplicates are left alone.

use std::time::Duration;

use chrono::Utc;
use ready_health::{HealthProbe, HealthVerifier};
use ready_silence::{Silence, SilenceClient, SilenceManager};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::age::{cluster_age_at, is_too_old};
use crate::birth::ClusterBirthSource;
use crate::config::JobConfig;
use crate::error::Result;

/// Allowance for how long one probe itself takes.
pub const PROBE_OVERHEAD: Duration = Duration::from_secs(10);

/// Slack added on top of a full health check pass.
pub const PASS_SLACK: Duration = Duration::from_secs(2 * 60);

/// How a run of the job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// The cluster is past its bring-up window and was left alone.
    TooOld,
    /// The cluster passed its health checks and the silence was removed.
    Healthy,
}

impl std::fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooOld => write!(f, "too-old"),
            Self::Healthy => write!(f, "healthy"),
        }
    }
}

/// Timing knobs for the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSettings {
    /// Clusters older than this are left alone.
    pub max_cluster_age: Duration,
    /// Consecutive clean runs required.
    pub clean_check_runs: u32,
    /// Delay between clean runs.
    pub clean_check_interval: Duration,
    /// Delay after a failed pass.
    pub failed_check_interval: Duration,
}

impl From<&JobConfig> for JobSettings {
    fn from(config: &JobConfig) -> Self {
        Self {
            max_cluster_age: config.max_cluster_age(),
            clean_check_runs: config.clean_check_runs,
            clean_check_interval: config.clean_check_interval(),
            failed_check_interval: config.failed_check_interval(),
        }
    }
}

/// Upper bound on how long one health check pass can take.
///
/// Silences are sized to this so they outlive the pass they cover.
#[must_use]
pub fn max_health_check_duration(settings: &JobSettings) -> Duration {
    settings
        .clean_check_interval
        .saturating_add(PROBE_OVERHEAD)
        .saturating_mul(settings.clean_check_runs)
        .saturating_add(settings.failed_check_interval)
        .saturating_add(PASS_SLACK)
}

/// The readiness job.
#[derive(Debug)]
pub struct ReadinessJob<B, C, P> {
    birth: B,
    silences: SilenceManager<C>,
    verifier: HealthVerifier<P>,
    settings: JobSettings,
}

impl<B, C, P> ReadinessJob<B, C, P>
where
    B: ClusterBirthSource,
    C: SilenceClient,
    P: HealthProbe,
{
    /// Assembles a job from its collaborators.
    #[must_use]
    pub const fn new(
        birth: B,
        silences: SilenceManager<C>,
        verifier: HealthVerifier<P>,
        settings: JobSettings,
    ) -> Self {
        Self {
            birth,
            silences,
            verifier,
            settings,
        }
    }

    /// Returns the timing settings.
    #[must_use]
    pub const fn settings(&self) -> &JobSettings {
        &self.settings
    }

    /// Runs the loop until the cluster is healthy or too old.
    ///
    /// # Errors
    ///
    /// Returns an error if the creation time cannot be determined, silence
    /// reconciliation fails, a health probe cannot be evaluated, or the
    /// silence cannot be removed after a healthy pass. A silence in place at
    /// that point is left to expire on its own.
    pub async fn run(&self) -> Result<JobOutcome> {
        let birth = self.birth.cluster_birth().await?;
        let window = max_health_check_duration(&self.settings);
        info!(
            cluster_birth = %birth,
            max_age_minutes = self.settings.max_cluster_age.as_secs() / 60,
            silence_window_secs = window.as_secs(),
            "starting readiness checks"
        );

        let mut current: Option<Silence> = None;
        let mut superseded: Vec<String> = Vec::new();
        loop {
            if is_too_old(birth, self.settings.max_cluster_age) {
                info!(
                    age_minutes = cluster_age_at(birth, Utc::now()).num_minutes(),
                    "cluster is older than the bring-up window, exiting cleanly"
                );
                self.cleanup_best_effort(current.as_ref(), &superseded).await;
                return Ok(JobOutcome::TooOld);
            }

            let reconciled = self
                .reconcile_silence(current.take(), &mut superseded, window)
                .await?;
            let silence = current.insert(reconciled);

            let healthy = self
                .verifier
                .is_healthy(self.settings.clean_check_runs, self.settings.clean_check_interval)
                .await?;
            if healthy {
                info!("health checks succeeded, removing silence");
                self.remove_owned(silence, &superseded).await?;
                return Ok(JobOutcome::Healthy);
            }

            info!(
                retry_in_secs = self.settings.failed_check_interval.as_secs(),
                "cluster not healthy yet"
            );
            sleep(self.settings.failed_check_interval).await;
        }
    }

    /// Ensures an owned silence will outlast a pass of `window`.
    ///
    /// `tracked` is the silence chosen by the previous iteration. It is kept
    /// while the store still lists it as active and it covers the pass.
    /// Otherwise an owned silence that covers the pass is adopted, and a new
    /// one is created only when none does. The too-short silence it replaces
    /// is recorded in `superseded` and left to expire until the job exits.
    async fn reconcile_silence(
        &self,
        tracked: Option<Silence>,
        superseded: &mut Vec<String>,
        window: Duration,
    ) -> Result<Silence> {
        let owned = self.silences.list_owned().await?;

        if let Some(tracked) = tracked {
            match owned.iter().find(|s| s.id == tracked.id) {
                Some(listed) if !listed.will_expire_by(window) => {
                    debug!(
                        silence_id = %listed.id,
                        remaining_secs = listed.remaining().num_seconds(),
                        "silence still covers the next health check pass"
                    );
                    return Ok(listed.clone());
                }
                Some(listed) => note_superseded(superseded, &listed.id),
                None => info!(silence_id = %tracked.id, "silence is no longer active"),
            }
        }

        if let Some(existing) = owned.iter().find(|s| !s.will_expire_by(window)) {
            info!(
                silence_id = %existing.id,
                remaining_secs = existing.remaining().num_seconds(),
                "existing silence covers the next health check pass"
            );
            return Ok(existing.clone());
        }

        if let Some(short) = owned.first() {
            info!(
                silence_id = %short.id,
                window_secs = short.window().as_secs(),
                needed_secs = window.as_secs(),
                "existing silence too short, creating a replacement"
            );
            note_superseded(superseded, &short.id);
        }
        Ok(self.silences.create(window).await?)
    }

    /// Removes the silence covering the healthy pass, then every silence it
    /// superseded that the store still lists as active.
    async fn remove_owned(&self, silence: &Silence, superseded: &[String]) -> Result<()> {
        self.remove_one(silence).await?;
        for old in self.still_active(superseded).await? {
            self.remove_one(&old).await?;
        }
        Ok(())
    }

    /// Removes our silences, logging instead of failing.
    ///
    /// Before the first silence is tracked the store is searched for one
    /// left by an earlier run.
    async fn cleanup_best_effort(&self, tracked: Option<&Silence>, superseded: &[String]) {
        let target = match tracked {
            Some(silence) => Some(silence.clone()),
            None => self.silences.find_existing().await.unwrap_or_else(|e| {
                warn!(error = %e, "failed to look up silence for cleanup");
                None
            }),
        };
        if let Some(silence) = &target {
            if let Err(e) = self.remove_one(silence).await {
                warn!(silence_id = %silence.id, error = %e, "failed to remove silence");
            }
        }

        match self.still_active(superseded).await {
            Ok(old) => {
                for silence in &old {
                    if let Err(e) = self.remove_one(silence).await {
                        warn!(silence_id = %silence.id, error = %e, "failed to remove silence");
                    }
                }
            }
            Err(e) => warn!(error = %e, "failed to look up superseded silences"),
        }
    }

    /// Owned silences from `ids` that the store still lists as active.
    async fn still_active(&self, ids: &[String]) -> Result<Vec<Silence>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .silences
            .list_owned()
            .await?
            .into_iter()
            .filter(|s| ids.contains(&s.id))
            .collect())
    }

    async fn remove_one(&self, silence: &Silence) -> Result<()> {
        info!(
            silence_id = %silence.id,
            remaining_secs = silence.remaining().num_seconds(),
            "silence had validity remaining"
        );
        self.silences.remove(silence).await?;
        Ok(())
    }
}

fn note_superseded(superseded: &mut Vec<String>, id: &str) {
    if !superseded.iter().any(|s| s == id) {
        superseded.push(id.to_string());
    }
}

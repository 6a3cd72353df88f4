//! Cluster readiness job.
//!
//! Runs once on a freshly installed cluster. While the cluster settles it
//! keeps a match-all Alertmanager silence in place, repeatedly checks cluster
//! health, and removes the silence once enough consecutive checks pass. A
//! cluster older than the bring-up window is left alone.
//!
//! # Architecture
//!
//! - [`age`]: age gate against the configured maximum
//! - [`birth`]: cluster creation time from Prometheus
//! - [`config`]: flags and environment variables
//! - [`job`]: the control loop tying silences and health checks together

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod age;
pub mod birth;
pub mod config;
pub mod error;
pub mod job;

pub use age::{is_too_old, is_too_old_at};
pub use birth::{ClusterBirthSource, FixedBirth, PrometheusBirthSource, decode_cluster_birth};
pub use config::{JobConfig, LogFormat};
pub use error::{JobError, Result};
pub use job::{JobOutcome, JobSettings, ReadinessJob, max_health_check_duration};

use ready_exec::{PodHttp, PodTarget};
use ready_health::{ClusterOperatorProbe, HealthVerifier};
use ready_silence::{AlertmanagerClient, RetryPolicy, SilenceManager, SilenceManagerConfig};

/// The job wired to the live cluster.
pub type ClusterReadinessJob =
    ReadinessJob<PrometheusBirthSource, AlertmanagerClient, ClusterOperatorProbe>;

/// Builds the job against the live cluster described by `config`.
///
/// # Errors
///
/// Returns `JobError::InvalidConfig` if a pod coordinate or the `oc` path is
/// rejected.
pub fn from_config(config: &JobConfig) -> Result<ClusterReadinessJob> {
    let alertmanager = PodTarget::new(
        &config.monitoring_namespace,
        &config.alertmanager_pod,
        &config.alertmanager_container,
    )?;
    let prometheus = PodTarget::new(
        &config.monitoring_namespace,
        &config.prometheus_pod,
        &config.prometheus_container,
    )?;
    ready_exec::command::validate_program_path(&config.oc_path)?;

    let silences = SilenceManager::with_config(
        AlertmanagerClient::new(PodHttp::new(config.oc_path.as_str(), alertmanager)),
        SilenceManagerConfig {
            created_by: config.silence_created_by.clone(),
            comment: config.silence_comment.clone(),
            retry: RetryPolicy::default(),
        },
    );

    Ok(ReadinessJob::new(
        PrometheusBirthSource::new(PodHttp::new(config.oc_path.as_str(), prometheus)),
        silences,
        HealthVerifier::new(ClusterOperatorProbe::new(config.oc_path.as_str())),
        JobSettings::from(config),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn builds_from_default_config() {
        let config = JobConfig::try_parse_from(["cluster-ready"]).unwrap();
        let job = from_config(&config).unwrap();
        assert_eq!(job.settings().clean_check_runs, 20);
    }

    #[test]
    fn rejects_bad_pod_name() {
        let config =
            JobConfig::try_parse_from(["cluster-ready", "--alertmanager-pod", "Not_A_Pod"])
                .unwrap();
        assert!(matches!(from_config(&config), Err(JobError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_bad_oc_path() {
        let config = JobConfig::try_parse_from(["cluster-ready", "--oc-path", "oc;rm"]).unwrap();
        assert!(matches!(from_config(&config), Err(JobError::InvalidConfig(_))));
    }
}

//! Command-line and environment configuration with clap.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use ready_exec::DEFAULT_OC_PROGRAM;
use ready_silence::{DEFAULT_COMMENT, DEFAULT_CREATED_BY};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Cluster readiness job: keeps alerts silenced while a new cluster settles.
#[derive(Parser, Debug, Clone)]
#[command(name = "cluster-ready")]
#[command(version, about, long_about = None)]
pub struct JobConfig {
    /// Clusters older than this many minutes are left alone.
    #[arg(long, env = "MAX_CLUSTER_AGE_MINUTES", default_value_t = 120)]
    pub max_cluster_age_minutes: u64,

    /// Consecutive clean health check runs required.
    #[arg(long, env = "CLEAN_CHECK_RUNS", default_value_t = 20)]
    pub clean_check_runs: u32,

    /// Seconds between clean health check runs.
    #[arg(long, env = "CLEAN_CHECK_INTERVAL_SECONDS", default_value_t = 30)]
    pub clean_check_interval_seconds: u64,

    /// Seconds to wait after a failed health check pass.
    #[arg(long, env = "FAILED_CHECK_INTERVAL_SECONDS", default_value_t = 60)]
    pub failed_check_interval_seconds: u64,

    /// Provenance tag for silences owned by this job.
    #[arg(long, env = "SILENCE_CREATED_BY", default_value = DEFAULT_CREATED_BY)]
    pub silence_created_by: String,

    /// Comment attached to created silences.
    #[arg(long, env = "SILENCE_COMMENT", default_value = DEFAULT_COMMENT)]
    pub silence_comment: String,

    /// Namespace of the monitoring stack.
    #[arg(long, env = "MONITORING_NAMESPACE", default_value = "openshift-monitoring")]
    pub monitoring_namespace: String,

    /// Alertmanager pod.
    #[arg(long, env = "ALERTMANAGER_POD", default_value = "alertmanager-main-0")]
    pub alertmanager_pod: String,

    /// Alertmanager container.
    #[arg(long, env = "ALERTMANAGER_CONTAINER", default_value = "alertmanager")]
    pub alertmanager_container: String,

    /// Prometheus pod.
    #[arg(long, env = "PROMETHEUS_POD", default_value = "prometheus-k8s-0")]
    pub prometheus_pod: String,

    /// Prometheus container.
    #[arg(long, env = "PROMETHEUS_CONTAINER", default_value = "prometheus")]
    pub prometheus_container: String,

    /// Path to the `oc` binary.
    #[arg(long, env = "OC_PATH", default_value = DEFAULT_OC_PROGRAM)]
    pub oc_path: String,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl JobConfig {
    /// Maximum cluster age.
    #[must_use]
    pub const fn max_cluster_age(&self) -> Duration {
        Duration::from_secs(self.max_cluster_age_minutes.saturating_mul(60))
    }

    /// Delay between clean health check runs.
    #[must_use]
    pub const fn clean_check_interval(&self) -> Duration {
        Duration::from_secs(self.clean_check_interval_seconds)
    }

    /// Delay after a failed health check pass.
    #[must_use]
    pub const fn failed_check_interval(&self) -> Duration {
        Duration::from_secs(self.failed_check_interval_seconds)
    }
}

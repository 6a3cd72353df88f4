//! Cluster creation time.
//!
//! The installer records the initial cluster version as a Prometheus series
//! (`cluster_version{type="initial"}`) whose value is the install time in
//! Unix seconds. [`PrometheusBirthSource`] queries it from inside the
//! Prometheus pod.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use ready_exec::{ExecError, FixedRetry, HttpResponse, PodHttp, RetryError, retry_fixed};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::error::{JobError, Result};

/// Where Prometheus listens inside its pod.
pub const DEFAULT_PROMETHEUS_URL: &str = "localhost:9090";

/// Series type carrying the install time.
const INITIAL_SERIES: &str = "initial";

/// Source of the cluster's creation time.
pub trait ClusterBirthSource: Send + Sync {
    /// Returns when the cluster was created.
    fn cluster_birth(&self) -> impl Future<Output = Result<DateTime<Utc>>> + Send;
}

/// Why a single cluster birth query failed.
#[derive(Debug, Error)]
pub enum BirthError {
    /// The query could not be made.
    #[error("prometheus query failed: {0}")]
    Transport(#[from] ExecError),

    /// Prometheus answered with a non-2xx status.
    #[error("prometheus returned HTTP {status}: {body}")]
    UnexpectedStatus {
        /// The HTTP status code.
        status: u16,
        /// The response body.
        body: String,
    },

    /// The initial cluster version series has not been scraped yet.
    #[error("no initial cluster_version series")]
    NoInitialSeries,

    /// The response is not a usable query result.
    #[error("malformed cluster_version response: {reason}")]
    Malformed {
        /// What could not be parsed.
        reason: String,
    },
}

impl BirthError {
    /// Whether querying again could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_transient(),
            Self::UnexpectedStatus { .. } | Self::NoInitialSeries => true,
            Self::Malformed { .. } => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    data: QueryData,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    result: Vec<Series>,
}

#[derive(Debug, Deserialize)]
struct Series {
    #[serde(default)]
    metric: std::collections::HashMap<String, String>,
    value: (serde_json::Value, String),
}

/// Extract the cluster creation time from a `cluster_version` query response.
///
/// # Errors
///
/// Returns `UnexpectedStatus` for non-2xx responses, `NoInitialSeries` when
/// the result has no `type="initial"` series, and `Malformed` when the body
/// or the timestamp cannot be parsed.
pub fn decode_cluster_birth(resp: &HttpResponse) -> std::result::Result<DateTime<Utc>, BirthError> {
    if !resp.is_success() {
        return Err(BirthError::UnexpectedStatus {
            status: resp.status,
            body: resp.body_lossy().trim().to_string(),
        });
    }
    let parsed: QueryResponse =
        serde_json::from_slice(&resp.body).map_err(|e| BirthError::Malformed {
            reason: e.to_string(),
        })?;

    let series = parsed
        .data
        .result
        .into_iter()
        .find(|s| s.metric.get("type").map(String::as_str) == Some(INITIAL_SERIES))
        .ok_or(BirthError::NoInitialSeries)?;

    let raw = series.value.1.trim();
    let secs: i64 = raw.parse().map_err(|_| BirthError::Malformed {
        reason: format!("install time {raw:?} is not Unix seconds"),
    })?;
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| BirthError::Malformed {
            reason: format!("install time {secs} is out of range"),
        })
}

/// Cluster birth from the Prometheus `cluster_version` series.
#[derive(Debug, Clone)]
pub struct PrometheusBirthSource {
    http: PodHttp,
    base_url: String,
    retry: FixedRetry,
}

impl PrometheusBirthSource {
    /// Creates a source querying Prometheus at its default local URL.
    ///
    /// Queries are retried once a second for up to 300 attempts.
    #[must_use]
    pub fn new(http: PodHttp) -> Self {
        Self {
            http,
            base_url: DEFAULT_PROMETHEUS_URL.to_string(),
            retry: FixedRetry::bounded(300, Duration::from_secs(1)),
        }
    }

    /// Overrides the retry cadence.
    #[must_use]
    pub const fn with_retry(mut self, retry: FixedRetry) -> Self {
        self.retry = retry;
        self
    }

    fn query_url(&self) -> String {
        format!("{}/api/v1/query", self.base_url)
    }

    async fn query_once(&self) -> std::result::Result<DateTime<Utc>, BirthError> {
        let resp = self
            .http
            .post_form(&self.query_url(), &[("query", "cluster_version")])
            .await?;
        decode_cluster_birth(&resp)
    }
}

impl ClusterBirthSource for PrometheusBirthSource {
    async fn cluster_birth(&self) -> Result<DateTime<Utc>> {
        let birth = retry_fixed(
            &self.retry,
            "query cluster creation time",
            BirthError::is_transient,
            || self.query_once(),
        )
        .await
        .map_err(|e| match e {
            RetryError::Fatal(e) => JobError::Birth(e),
            RetryError::Exhausted { attempts, last } => JobError::BirthUnavailable {
                attempts,
                reason: last.to_string(),
            },
        })?;
        info!(cluster_birth = %birth, "cluster created");
        Ok(birth)
    }
}

/// A cluster birth known up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBirth(pub DateTime<Utc>);

impl ClusterBirthSource for FixedBirth {
    async fn cluster_birth(&self) -> Result<DateTime<Utc>> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resp(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            body: body.as_bytes().to_vec(),
        }
    }

    const QUERY_RESULT: &str = r#"{
        "status": "success",
        "data": {
            "resultType": "vector",
            "result": [
                {"metric": {"__name__": "cluster_version", "type": "current", "version": "4.14.1"},
                 "value": [1700003600.123, "1700000900"]},
                {"metric": {"__name__": "cluster_version", "type": "initial", "version": "4.14.1"},
                 "value": [1700003600.123, "1700000000"]}
            ]
        }
    }"#;

    #[test]
    fn picks_initial_series() {
        let birth = decode_cluster_birth(&resp(200, QUERY_RESULT)).unwrap();
        assert_eq!(birth.timestamp(), 1_700_000_000);
    }

    #[test]
    fn missing_initial_series_is_transient() {
        let body = r#"{"status":"success","data":{"resultType":"vector","result":[]}}"#;
        let err = decode_cluster_birth(&resp(200, body)).unwrap_err();
        assert!(matches!(err, BirthError::NoInitialSeries));
        assert!(err.is_transient());
    }

    #[test]
    fn non_numeric_timestamp_is_malformed() {
        let body = r#"{"data":{"result":[{"metric":{"type":"initial"},"value":[1,"soon"]}]}}"#;
        let err = decode_cluster_birth(&resp(200, body)).unwrap_err();
        assert!(matches!(err, BirthError::Malformed { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn garbage_is_malformed() {
        let err = decode_cluster_birth(&resp(200, "not json")).unwrap_err();
        assert!(!err.is_transient());
    }

    #[test]
    fn server_error_is_transient() {
        assert!(decode_cluster_birth(&resp(503, "")).unwrap_err().is_transient());
    }

    #[tokio::test]
    async fn fixed_birth_returns_its_time() {
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(FixedBirth(at).cluster_birth().await.unwrap(), at);
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_prometheus_exhausts_retries() {
        let target =
            ready_exec::PodTarget::new("openshift-monitoring", "prometheus-k8s-0", "prometheus")
                .unwrap();
        let source = PrometheusBirthSource::new(PodHttp::new("/nonexistent/oc-binary", target))
            .with_retry(FixedRetry::bounded(3, Duration::from_secs(1)));

        let err = source.cluster_birth().await.unwrap_err();
        assert!(matches!(err, JobError::BirthUnavailable { attempts: 3, .. }));
    }
}

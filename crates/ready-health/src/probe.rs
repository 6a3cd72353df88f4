//! Health probes.
//!
//! A [`HealthProbe`] runs one round of checks against the cluster and reports
//! a [`HealthOutcome`]. The production probe, [`ClusterOperatorProbe`], asks
//! the cluster for its `ClusterOperator` resources and requires every one of
//! them to be available and not degraded.

use std::future::Future;

use ready_exec::{DEFAULT_OC_PROGRAM, OcCommand};
use serde::Deserialize;
use tracing::debug;

use crate::outcome::HealthOutcome;

/// One round of cluster health checks.
pub trait HealthProbe: Send + Sync {
    /// Run the checks once.
    fn probe(&self) -> impl Future<Output = HealthOutcome> + Send;
}

#[derive(Debug, Deserialize)]
struct OperatorList {
    items: Vec<Operator>,
}

#[derive(Debug, Deserialize)]
struct Operator {
    metadata: Metadata,
    #[serde(default)]
    status: OperatorStatus,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct OperatorStatus {
    #[serde(default)]
    conditions: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    #[serde(rename = "type")]
    kind: String,
    status: String,
    #[serde(default)]
    message: String,
}

impl Operator {
    fn condition(&self, kind: &str) -> Option<&Condition> {
        self.status.conditions.iter().find(|c| c.kind == kind)
    }

    /// Why this operator is unhealthy, or `None` if it is healthy.
    fn problem(&self) -> Option<String> {
        let name = &self.metadata.name;
        match self.condition("Available") {
            Some(c) if c.status == "True" => {}
            Some(c) => return Some(format!("{name}: not available: {}", c.message)),
            None => return Some(format!("{name}: no Available condition reported")),
        }
        match self.condition("Degraded") {
            Some(c) if c.status == "True" => Some(format!("{name}: degraded: {}", c.message)),
            _ => None,
        }
    }
}

/// Evaluate the JSON output of `oc get clusteroperators -o json`.
///
/// Unparseable output or an empty operator list is an `Error`: neither tells
/// us anything about the cluster.
#[must_use]
pub fn evaluate_cluster_operators(json: &[u8]) -> HealthOutcome {
    let list: OperatorList = match serde_json::from_slice(json) {
        Ok(list) => list,
        Err(e) => return HealthOutcome::Error(format!("unparseable clusteroperators: {e}")),
    };
    if list.items.is_empty() {
        return HealthOutcome::Error("no clusteroperators reported".to_string());
    }

    let problems: Vec<String> = list.items.iter().filter_map(Operator::problem).collect();
    debug!(
        operators = list.items.len(),
        unhealthy = problems.len(),
        "evaluated clusteroperators"
    );
    if problems.is_empty() {
        HealthOutcome::Success
    } else {
        HealthOutcome::Failure(problems)
    }
}

/// Probe backed by the cluster's `ClusterOperator` conditions.
#[derive(Debug, Clone)]
pub struct ClusterOperatorProbe {
    oc: String,
}

impl ClusterOperatorProbe {
    /// Creates a probe that runs the given `oc` program.
    #[must_use]
    pub fn new(oc: impl Into<String>) -> Self {
        Self { oc: oc.into() }
    }

    fn command(&self) -> OcCommand {
        OcCommand::new(&self.oc).args(["get", "clusteroperators", "-o", "json"])
    }
}

impl Default for ClusterOperatorProbe {
    fn default() -> Self {
        Self::new(DEFAULT_OC_PROGRAM)
    }
}

impl HealthProbe for ClusterOperatorProbe {
    async fn probe(&self) -> HealthOutcome {
        match self.command().execute().await {
            Ok(output) => evaluate_cluster_operators(&output.stdout),
            Err(e) => HealthOutcome::Error(e.to_string()),
        }
    }
}

//! Alertmanager silence lifecycle for the cluster readiness job.
//!
//! While a new cluster settles, the job keeps a single match-all silence in
//! Alertmanager so on-call is not paged for expected provisioning noise.
//! The silence is tagged with a provenance string so the job can find it
//! again on a later run and remove it once the cluster is healthy.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use ready_exec::{PodHttp, PodTarget};
//! use ready_silence::{AlertmanagerClient, SilenceManager};
//!
//! # async fn example() -> ready_silence::Result<()> {
//! let target = PodTarget::new("openshift-monitoring", "alertmanager-main-0", "alertmanager")?;
//! let manager = SilenceManager::new(AlertmanagerClient::new(PodHttp::new("oc", target)));
//!
//! let silence = match manager.find_existing().await? {
//!     Some(existing) => existing,
//!     None => manager.create(Duration::from_secs(3600)).await?,
//! };
//! manager.remove(&silence).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod manager;
pub mod types;

/// In-memory store for tests (requires the `test-helpers` feature).
#[cfg(any(test, feature = "test-helpers"))]
pub mod fake;

pub use client::{AlertmanagerClient, DEFAULT_ALERTMANAGER_URL, SilenceClient};
pub use error::{Result, SilenceError};
pub use manager::{
    DEFAULT_COMMENT, DEFAULT_CREATED_BY, RetryPolicy, SilenceManager, SilenceManagerConfig,
    select_owned,
};
pub use types::{Matcher, Silence, SilenceState, SilenceStatus};

//! Privileged execution channel for the cluster readiness job.
//!
//! Everything the job learns about the cluster comes from running `oc`:
//! either directly (`oc get …`) or as `oc exec` into a monitoring pod where
//! `curl` reaches a service on localhost.
//!
//! ```rust,no_run
//! use ready_exec::{PodHttp, PodTarget};
//!
//! # async fn example() -> ready_exec::Result<()> {
//! let target = PodTarget::new("openshift-monitoring", "alertmanager-main-0", "alertmanager")?;
//! let http = PodHttp::new("oc", target);
//! let resp = http.get("localhost:9093/api/v2/silences").await?;
//! println!("{} {}", resp.status, resp.body_lossy());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod error;
pub mod http;
pub mod retry;
pub mod target;

pub use command::{CommandOutput, DEFAULT_OC_PROGRAM, OcCommand};
pub use error::{ExecError, Result};
pub use http::{HttpResponse, Method, PodHttp, parse_curl_output};
pub use retry::{FixedRetry, RetryError, retry_fixed};
pub use target::PodTarget;

//! Silence store clients.
//!
//! [`SilenceClient`] is the seam between silence lifecycle decisions and the
//! store that holds silences. [`AlertmanagerClient`] talks to the Alertmanager
//! v2 API inside the Alertmanager pod.

use std::future::Future;

use ready_exec::{HttpResponse, PodHttp};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Result, SilenceError};
use crate::types::Silence;

/// Where Alertmanager listens inside its pod.
pub const DEFAULT_ALERTMANAGER_URL: &str = "localhost:9093";

/// Operations the silence store offers.
pub trait SilenceClient: Send + Sync {
    /// List every silence the store knows about.
    fn list(&self) -> impl Future<Output = Result<Vec<Silence>>> + Send;

    /// Submit a new silence and return the store-assigned ID.
    fn create(&self, silence: &Silence) -> impl Future<Output = Result<String>> + Send;

    /// Delete a silence by ID.
    ///
    /// Returns `SilenceError::NotFound` if the store has no such silence.
    fn delete(&self, id: &str) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    #[serde(rename = "silenceID")]
    silence_id: String,
}

fn unexpected(resp: &HttpResponse) -> SilenceError {
    SilenceError::UnexpectedStatus {
        status: resp.status,
        body: resp.body_lossy().trim().to_string(),
    }
}

/// Interpret the response to `GET /api/v2/silences`.
///
/// Records that do not parse as a silence are skipped with a warning. The
/// store holds silences from other tools too, and one odd record must not
/// hide ours.
///
/// # Errors
///
/// Returns `UnexpectedStatus` for non-2xx responses and `MalformedResponse`
/// if the body is not a JSON array.
pub fn decode_list(resp: &HttpResponse) -> Result<Vec<Silence>> {
    if !resp.is_success() {
        return Err(unexpected(resp));
    }
    let records: Vec<serde_json::Value> = serde_json::from_slice(&resp.body)?;
    let mut silences = Vec::with_capacity(records.len());
    for record in records {
        let id = record
            .get("id")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();
        match serde_json::from_value::<Silence>(record) {
            Ok(silence) => silences.push(silence),
            Err(e) => warn!(silence_id = %id, error = %e, "skipping unreadable silence"),
        }
    }
    Ok(silences)
}

/// Interpret the response to `POST /api/v2/silences`.
///
/// # Errors
///
/// Returns `UnexpectedStatus` for non-2xx responses and `MalformedResponse`
/// if the body carries no silence ID.
pub fn decode_create(resp: &HttpResponse) -> Result<String> {
    if !resp.is_success() {
        return Err(unexpected(resp));
    }
    let created: CreateResponse = serde_json::from_slice(&resp.body)?;
    if created.silence_id.is_empty() {
        return Err(SilenceError::MalformedResponse {
            reason: "empty silenceID".to_string(),
        });
    }
    Ok(created.silence_id)
}

/// Interpret the response to `DELETE /api/v2/silence/{id}`.
///
/// # Errors
///
/// Returns `NotFound` for 404 and `UnexpectedStatus` for other non-2xx
/// responses.
pub fn decode_delete(resp: &HttpResponse, id: &str) -> Result<()> {
    if resp.is_not_found() {
        return Err(SilenceError::NotFound { id: id.to_string() });
    }
    if !resp.is_success() {
        return Err(unexpected(resp));
    }
    Ok(())
}

/// Alertmanager v2 API reached through `oc exec` into the Alertmanager pod.
#[derive(Debug, Clone)]
pub struct AlertmanagerClient {
    http: PodHttp,
    base_url: String,
}

impl AlertmanagerClient {
    /// Create a client for Alertmanager listening on the default local URL.
    #[must_use]
    pub fn new(http: PodHttp) -> Self {
        Self::with_base_url(http, DEFAULT_ALERTMANAGER_URL)
    }

    /// Create a client for Alertmanager listening at `base_url` inside the pod.
    #[must_use]
    pub fn with_base_url(http: PodHttp, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn silences_url(&self) -> String {
        format!("{}/api/v2/silences", self.base_url)
    }

    fn silence_url(&self, id: &str) -> String {
        format!("{}/api/v2/silence/{id}", self.base_url)
    }
}

impl SilenceClient for AlertmanagerClient {
    async fn list(&self) -> Result<Vec<Silence>> {
        let resp = self.http.get(&self.silences_url()).await?;
        let silences = decode_list(&resp)?;
        debug!(count = silences.len(), "listed silences");
        Ok(silences)
    }

    async fn create(&self, silence: &Silence) -> Result<String> {
        let body = serde_json::to_string(silence).map_err(|e| SilenceError::InvalidSilence {
            reason: format!("failed to encode silence: {e}"),
        })?;
        let resp = self.http.post_json(&self.silences_url(), &body).await?;
        decode_create(&resp)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let resp = self.http.delete(&self.silence_url(id)).await?;
        decode_delete(&resp, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ready_exec::PodTarget;

    fn resp(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn decode_empty_list() {
        assert!(decode_list(&resp(200, "[]")).unwrap().is_empty());
    }

    #[test]
    fn decode_list_rejects_garbage() {
        let err = decode_list(&resp(200, "<html>oops</html>")).unwrap_err();
        assert!(matches!(err, SilenceError::MalformedResponse { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn decode_list_skips_unreadable_records() {
        let body = r#"[
            {"id": "theirs", "status": {"state": "active"}, "matchers": [],
             "startsAt": "yesterday", "endsAt": "today", "createdBy": "legacy tool"},
            {"id": "ours", "status": {"state": "active"},
             "matchers": [{"name": "severity", "value": ".*", "isRegex": true, "isEqual": true}],
             "startsAt": "2023-11-14T22:13:20.000Z", "endsAt": "2023-11-14T23:13:20.000Z",
             "createdBy": "job", "comment": ""}
        ]"#;
        let silences = decode_list(&resp(200, body)).unwrap();
        assert_eq!(silences.len(), 1);
        assert_eq!(silences[0].id, "ours");
        assert!(silences[0].is_active());
    }

    #[test]
    fn decode_list_rejects_non_array() {
        assert!(matches!(
            decode_list(&resp(200, r#"{"id": "ours"}"#)),
            Err(SilenceError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn decode_list_server_error_is_transient() {
        let err = decode_list(&resp(503, "not ready")).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn decode_create_returns_id() {
        let id = decode_create(&resp(200, r#"{"silenceID":"8d3f"}"#)).unwrap();
        assert_eq!(id, "8d3f");
    }

    #[test]
    fn decode_create_requires_id() {
        assert!(matches!(
            decode_create(&resp(200, r#"{"silenceID":""}"#)),
            Err(SilenceError::MalformedResponse { .. })
        ));
        assert!(matches!(
            decode_create(&resp(200, "{}")),
            Err(SilenceError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn decode_create_bad_request_is_fatal() {
        assert!(!decode_create(&resp(400, "bad")).unwrap_err().is_transient());
    }

    #[test]
    fn decode_delete_statuses() {
        assert!(decode_delete(&resp(200, ""), "a").is_ok());
        assert!(matches!(
            decode_delete(&resp(404, ""), "a"),
            Err(SilenceError::NotFound { .. })
        ));
        assert!(matches!(
            decode_delete(&resp(500, "boom"), "a"),
            Err(SilenceError::UnexpectedStatus { status: 500, .. })
        ));
    }

    #[test]
    fn urls_are_built_from_base() {
        let target =
            PodTarget::new("openshift-monitoring", "alertmanager-main-0", "alertmanager").unwrap();
        let client = AlertmanagerClient::with_base_url(PodHttp::new("oc", target), "localhost:9093/");
        assert_eq!(client.silences_url(), "localhost:9093/api/v2/silences");
        assert_eq!(client.silence_url("abc"), "localhost:9093/api/v2/silence/abc");
    }
}

//! HTTP requests issued from inside a pod with `curl`.
//!
//! The in-cluster monitoring APIs listen on localhost inside their pods, so
//! requests are made by running `curl` through `oc exec`. The response status
//! is appended to stdout with `-w` so callers can distinguish "not found"
//! from a failed call.

use tracing::debug;

use crate::command::OcCommand;
use crate::error::{ExecError, Result};
use crate::target::PodTarget;

/// `curl -w` format that appends the status code on its own line.
const STATUS_FORMAT: &str = r"\n%{http_code}";

/// HTTP method used for a pod request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET.
    Get,
    /// POST.
    Post,
    /// DELETE.
    Delete,
}

impl Method {
    /// The method name as sent by curl.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

/// Response to a pod HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// True for 2xx responses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True for 404 responses.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Body as a UTF-8 string, replacing invalid characters.
    #[must_use]
    pub fn body_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Split curl's stdout into body and the trailing status line.
///
/// # Errors
///
/// Returns `ExecError::MalformedOutput` if no status line is present.
pub fn parse_curl_output(stdout: &[u8]) -> Result<HttpResponse> {
    let split = stdout
        .iter()
        .rposition(|b| *b == b'\n')
        .ok_or_else(|| ExecError::malformed("missing HTTP status line"))?;

    let status_text = String::from_utf8_lossy(&stdout[split + 1..]);
    let status = status_text.trim().parse::<u16>().map_err(|_| {
        ExecError::malformed(format!("invalid HTTP status '{}'", status_text.trim()))
    })?;

    // curl reports 000 when no response was received at all
    if status == 0 {
        return Err(ExecError::non_zero_exit("curl", 0, "no HTTP response received"));
    }

    Ok(HttpResponse {
        status,
        body: stdout[..split].to_vec(),
    })
}

/// Issues HTTP requests to a service listening inside a pod.
#[derive(Debug, Clone)]
pub struct PodHttp {
    program: String,
    target: PodTarget,
}

impl PodHttp {
    /// Create a client that reaches `target` through the given `oc` program.
    #[must_use]
    pub fn new(program: impl Into<String>, target: PodTarget) -> Self {
        Self {
            program: program.into(),
            target,
        }
    }

    /// The pod this client talks to.
    #[must_use]
    pub fn target(&self) -> &PodTarget {
        &self.target
    }

    /// Build the full `oc exec … -- curl …` command for a request.
    #[must_use]
    pub fn command(&self, method: Method, url: &str, extra: &[String]) -> OcCommand {
        OcCommand::exec_in(&self.program, &self.target)
            .args([
                "curl",
                "--silent",
                "--show-error",
                "-X",
                method.as_str(),
                "-w",
                STATUS_FORMAT,
                url,
            ])
            .args(extra)
    }

    async fn send(&self, method: Method, url: &str, extra: &[String]) -> Result<HttpResponse> {
        debug!(target_pod = %self.target, method = method.as_str(), url, "pod request");
        let output = self.command(method, url, extra).execute().await?;
        parse_curl_output(&output.stdout)
    }

    /// Send a GET request.
    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.send(Method::Get, url, &[]).await
    }

    /// Send a POST request with a JSON body.
    pub async fn post_json(&self, url: &str, body: &str) -> Result<HttpResponse> {
        let extra = [
            "-H".to_string(),
            "Content-Type: application/json".to_string(),
            "--data".to_string(),
            body.to_string(),
        ];
        self.send(Method::Post, url, &extra).await
    }

    /// Send a POST request with url-encoded form fields.
    pub async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<HttpResponse> {
        let extra: Vec<String> = fields
            .iter()
            .flat_map(|(k, v)| ["--data-urlencode".to_string(), format!("{k}={v}")])
            .collect();
        self.send(Method::Post, url, &extra).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, url: &str) -> Result<HttpResponse> {
        self.send(Method::Delete, url, &[]).await
    }
}

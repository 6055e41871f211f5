use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::models::{RunPayload, RunRequest};
use crate::request::FetchError;

/// HTTP client for the strategy execution service.
#[derive(Debug, Clone)]
pub struct ExecutionClient {
    http: Client,
    base_url: String,
}

impl ExecutionClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Client with a transport-level timeout; the dashboard adds none of its own.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::new(http, base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run the requested strategies and return the raw result payload.
    pub async fn run_strategies(&self, request: &RunRequest) -> Result<RunPayload, FetchError> {
        let url = format!("{}/api/run", self.base_url);
        tracing::debug!(%url, strategies = ?request.strategies, "Requesting strategy run");

        let resp = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        // A connection lost mid-body is still a transport failure.
        let body = resp.bytes().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(api_error(status, &String::from_utf8_lossy(&body)));
        }

        decode_payload(&body)
    }
}

fn decode_payload(body: &[u8]) -> Result<RunPayload, FetchError> {
    serde_json::from_slice(body)
        .map_err(|e| FetchError::Other(format!("invalid response from strategy service: {e}")))
}

fn transport_error(e: reqwest::Error) -> FetchError {
    tracing::warn!(error = %e, timeout = e.is_timeout(), "Strategy service unreachable");
    FetchError::Network(e.to_string())
}

/// Build an API error, pulling `detail` out of a JSON error body when there
/// is one.
pub fn api_error(status: StatusCode, body: &str) -> FetchError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json.get("detail").cloned())
        .and_then(|detail| match detail {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });

    FetchError::Api {
        status: status.as_u16(),
        detail,
        message: format!("Request failed with status code {}", status.as_u16()),
    }
}

//! Crate-wide error hierarchy for site-connector.

use serde_json::Value;
use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type SiteConnectorResult<T> = Result<T, SiteConnectorError>;

/// Root error type for the site-connector crate.
#[derive(Debug, Error)]
pub enum SiteConnectorError {
    /// Input validation errors (missing fields, bad URL scheme, unknown code type).
    #[error("{0}")]
    Validation(String),

    /// Site credential probe failed; `hints` lists what the user should check.
    #[error("{message}")]
    Auth { message: String, hints: Vec<String> },

    /// Pushing code to a site failed.
    #[error("deployment failed: {0}")]
    Deployment(UpstreamFailure),

    /// Any other third-party call failed (OAuth token endpoint, site listing).
    #[error("upstream request failed: {0}")]
    Upstream(UpstreamFailure),

    /// Configuration problems (OAuth client not configured, HTTP client setup).
    #[error(transparent)]
    Config(#[from] SiteConnectorConfigError),
}

/// Details of a failed outbound call, preserved for the HTTP layer.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct UpstreamFailure {
    /// HTTP status returned by the upstream, `None` for transport failures.
    pub status: Option<u16>,
    /// Upstream response body (JSON when decodable, otherwise a string).
    pub body: Option<Value>,
    /// Human-readable summary.
    pub message: String,
}

impl UpstreamFailure {
    /// Builds a failure from a non-2xx response.
    pub async fn from_response(resp: reqwest::Response) -> Self {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        Self {
            status: Some(status.as_u16()),
            body: body_value(&text),
            message: format!("upstream returned HTTP {status}"),
        }
    }

    /// Builds a failure from a transport-level error.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            format!("could not connect: {err}")
        } else {
            format!("network error: {err}")
        };
        Self {
            status: err.status().map(|s| s.as_u16()),
            body: None,
            message,
        }
    }
}

/// Decodes a response body as JSON, falling back to a plain string.
pub fn body_value(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string())))
}

/// Configuration and setup errors.
#[derive(Debug, Error)]
pub enum SiteConnectorConfigError {
    /// A required OAuth setting is not configured.
    #[error("missing OAuth setting: {0}")]
    MissingOAuthSetting(&'static str),

    /// HTTP client could not be constructed.
    #[error("http client error: {0}")]
    Client(String),
}

impl From<reqwest::Error> for SiteConnectorConfigError {
    fn from(e: reqwest::Error) -> Self {
        SiteConnectorConfigError::Client(e.to_string())
    }
}

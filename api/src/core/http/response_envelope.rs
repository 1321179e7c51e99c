use serde::Serialize;
use serde_json::Value;

/// Success body: `{"success": true, ...data}`.
#[derive(Debug, Serialize)]
pub struct Success<T>
where
    T: Serialize,
{
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T> Success<T>
where
    T: Serialize,
{
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Error body shared by every failing route.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    /// Human-friendly error message.
    pub error: String,
    /// Stable, machine-readable error code (e.g. "BAD_REQUEST").
    pub code: &'static str,
    /// Remediation hints, e.g. after a failed site verification.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
    /// Upstream response body, forwarded as received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Raw model output that could not be parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(code: &'static str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code,
            hints: Vec::new(),
            details: None,
            raw: None,
        }
    }
}

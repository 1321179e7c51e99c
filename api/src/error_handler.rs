use ai_llm_service::AiLlmError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use review_workflow::WorkflowError;
use serde_json::Value;
use site_connector::{SiteConnectorError, body_value};
use thiserror::Error;
use tracing::error;

use crate::core::{app_state::ConfigError, http::response_envelope::ErrorEnvelope};

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] ConfigError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// Credentials were rejected; `hints` tell the user what to check.
    #[error("{message}")]
    Unauthorized { message: String, hints: Vec<String> },

    /// Model output could not be turned into code; `raw` is the model text.
    #[error("{message}")]
    Parse { message: String, raw: String },

    /// Rich HTTP error mapped from lower layers with specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
        details: Option<Value>,
    },
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,

            // custom mapped
            AppError::Http { status, .. } => *status,

            // 5xx
            AppError::Parse { .. }
            | AppError::Config(_)
            | AppError::Bind(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Unauthorized { .. } => "UNAUTHORIZED",
            AppError::Parse { .. } => "PARSE_ERROR",
            AppError::Http { code, .. } => code,
        }
    }

    fn upstream(code: &'static str, message: impl Into<String>, details: Option<Value>) -> Self {
        AppError::Http {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code,
            message: message.into(),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = ErrorEnvelope::new(self.error_code(), self.to_string());

        if status.is_server_error() {
            error!(%status, code = body.code, error = %body.error, "request failed");
        }

        match self {
            AppError::Unauthorized { hints, .. } => body.hints = hints,
            AppError::Parse { raw, .. } => body.raw = Some(raw),
            AppError::Http { details, .. } => body.details = details,
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<AiLlmError> for AppError {
    fn from(err: AiLlmError) -> Self {
        match err {
            AiLlmError::Validation(msg) => AppError::BadRequest(msg.to_string()),
            AiLlmError::Parse(p) => AppError::Parse {
                message: format!("Failed to parse generated code: {}", p.reason),
                raw: p.raw,
            },
            AiLlmError::Provider(p) => {
                let details = p.body().and_then(body_value);
                AppError::upstream("LLM_UPSTREAM_ERROR", p.to_string(), details)
            }
            AiLlmError::HttpTransport(e) => {
                AppError::upstream("LLM_UPSTREAM_ERROR", e.without_url().to_string(), None)
            }
            AiLlmError::Config(c) => AppError::upstream("CONFIG_ERROR", c.to_string(), None),
            other => AppError::upstream("LLM_ERROR", other.to_string(), None),
        }
    }
}

impl From<SiteConnectorError> for AppError {
    fn from(err: SiteConnectorError) -> Self {
        match err {
            SiteConnectorError::Validation(msg) => AppError::BadRequest(msg),
            SiteConnectorError::Auth { message, hints } => AppError::Unauthorized { message, hints },
            SiteConnectorError::Deployment(f) => AppError::upstream(
                "DEPLOYMENT_FAILED",
                format!("Deployment failed: {}", f.message),
                f.body,
            ),
            SiteConnectorError::Upstream(f) => AppError::upstream("UPSTREAM_ERROR", f.message, f.body),
            SiteConnectorError::Config(c) => AppError::upstream("CONFIG_ERROR", c.to_string(), None),
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Validation(msg) => AppError::BadRequest(msg),
            WorkflowError::NotFound(id) => AppError::NotFound(format!("Review {id} not found")),
            WorkflowError::Llm(e) => e.into(),
            WorkflowError::Site(e) => e.into(),
            other => AppError::upstream("WORKFLOW_ERROR", other.to_string(), None),
        }
    }
}

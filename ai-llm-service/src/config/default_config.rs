//! Gemini config loaded strictly from environment variables.
//!
//! # Environment variables
//!
//! - `GEMINI_API_KEY`   = API key (optional; `/health` reports whether it is set)
//! - `GEMINI_MODEL`     = model id (default `gemini-flash-latest`)
//! - `GEMINI_ENDPOINT`  = API base (default `https://generativelanguage.googleapis.com`)
//! - `LLM_TIMEOUT_SECS` = optional request timeout (u64)

use crate::{
    config::gemini_config::GeminiConfig,
    error_handler::{ConfigError, Result, env_opt, env_opt_u64, validate_http_endpoint},
};

/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-flash-latest";

/// Default Gemini API base.
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Constructs the Gemini config from the environment.
///
/// # Errors
/// - [`ConfigError::InvalidFormat`] if `GEMINI_ENDPOINT` is not http(s)
/// - [`ConfigError::InvalidNumber`] if `LLM_TIMEOUT_SECS` is not a number
/// - [`ConfigError::EmptyModel`] if `GEMINI_MODEL` is whitespace only
pub fn config_gemini() -> Result<GeminiConfig> {
    let endpoint = env_opt("GEMINI_ENDPOINT").unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.into());
    validate_http_endpoint("GEMINI_ENDPOINT", &endpoint)?;

    let model = match std::env::var("GEMINI_MODEL") {
        Ok(m) if m.trim().is_empty() && !m.is_empty() => return Err(ConfigError::EmptyModel.into()),
        Ok(m) if !m.is_empty() => m.trim().to_string(),
        _ => DEFAULT_GEMINI_MODEL.to_string(),
    };

    Ok(GeminiConfig {
        api_key: env_opt("GEMINI_API_KEY"),
        model,
        endpoint,
        timeout_secs: env_opt_u64("LLM_TIMEOUT_SECS")?,
    })
}

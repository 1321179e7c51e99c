/// Configuration for the Gemini `generateContent` endpoint.
///
/// The API key is kept out of `Debug` output so the config can be logged.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::gemini_config::GeminiConfig;
///
/// let cfg = GeminiConfig {
///     api_key: Some("secret".into()),
///     model: "gemini-flash-latest".into(),
///     endpoint: "https://generativelanguage.googleapis.com".into(),
///     timeout_secs: None,
/// };
/// assert!(cfg.generate_url().ends_with("/v1beta/models/gemini-flash-latest:generateContent"));
/// ```
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key sent as the `key` query parameter. `None` means requests go out unauthenticated.
    pub api_key: Option<String>,

    /// Model identifier (e.g. `gemini-flash-latest`).
    pub model: String,

    /// API base, e.g. `https://generativelanguage.googleapis.com`.
    pub endpoint: String,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

impl GeminiConfig {
    /// Full `generateContent` URL for the configured model, without the key.
    pub fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    /// Whether an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Sampling options for a single `generateContent` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    /// Sampling temperature.
    pub temperature: f32,
    /// Output token cap (`maxOutputTokens`).
    pub max_output_tokens: u32,
}

impl GenerationOptions {
    /// Options used when turning a review into an implementation prompt.
    pub const PROMPT: Self = Self {
        temperature: 0.7,
        max_output_tokens: 1024,
    };

    /// Options used when turning a prompt into code.
    pub const CODE: Self = Self {
        temperature: 0.7,
        max_output_tokens: 2048,
    };
}

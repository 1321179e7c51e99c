use std::sync::Arc;

use ai_llm_service::{
    AiLlmError, CodeGenClient, GeminiConfig, GeminiService,
    config::default_config::config_gemini, error_handler::env_opt,
};
use review_workflow::Coordinator;
use site_connector::{
    DeploymentClient, OAuthClient, OAuthConfig, SiteConnectorConfigError,
    SiteRegistry, SiteStore, oauth::DEFAULT_WPCOM_API_BASE,
};
use thiserror::Error;
use tracing::info;

/// Where the OAuth callback sends the browser when `FRONTEND_URL` is unset.
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";

/// Listen port used when neither `API_ADDRESS` nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Llm(#[from] AiLlmError),

    #[error(transparent)]
    Site(#[from] SiteConnectorConfigError),

    #[error("invalid PORT value: {0}")]
    InvalidPort(String),
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub oauth: OAuthConfig,
    pub frontend_url: String,
    /// `host:port` the listener binds to.
    pub bind_addr: String,
}

impl AppConfig {
    /// Loads configuration from environment variables.
    ///
    /// `API_ADDRESS` wins over `PORT`; with neither set the server listens on
    /// `0.0.0.0:5000`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let gemini = config_gemini()?;

        let oauth = OAuthConfig {
            client_id: env_opt("WORDPRESS_CLIENT_ID"),
            client_secret: env_opt("WORDPRESS_CLIENT_SECRET"),
            redirect_uri: env_opt("WORDPRESS_REDIRECT_URI"),
            authorize_url: env_opt("WORDPRESS_AUTHORIZE_URL"),
            token_url: env_opt("WORDPRESS_TOKEN_URL"),
            api_base: env_opt("WORDPRESS_API_BASE")
                .unwrap_or_else(|| DEFAULT_WPCOM_API_BASE.to_string()),
        };

        let bind_addr = match env_opt("API_ADDRESS") {
            Some(addr) => addr,
            None => {
                let port = match env_opt("PORT") {
                    Some(p) => p.parse::<u16>().map_err(|_| ConfigError::InvalidPort(p))?,
                    None => DEFAULT_PORT,
                };
                format!("0.0.0.0:{port}")
            }
        };

        Ok(Self {
            gemini,
            oauth,
            frontend_url: env_opt("FRONTEND_URL")
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            bind_addr,
        })
    }
}

/// Shared state for all HTTP handlers.
pub struct AppState {
    pub codegen: CodeGenClient,
    pub sites: SiteRegistry,
    pub deployer: DeploymentClient,
    pub oauth: OAuthClient,
    pub workflow: Coordinator,
    /// Frontend base the OAuth callback redirects to.
    pub frontend_url: String,
}

impl AppState {
    /// Builds every service once; handlers receive it through `Arc`.
    pub fn new(cfg: AppConfig, store: Arc<dyn SiteStore>) -> Result<Arc<Self>, ConfigError> {
        let codegen = CodeGenClient::new(Arc::new(GeminiService::new(cfg.gemini)?));

        let http = reqwest::Client::builder()
            .build()
            .map_err(SiteConnectorConfigError::from)?;
        let deployer = DeploymentClient::new(http.clone());
        let oauth = OAuthClient::new(http.clone(), cfg.oauth);

        info!(
            has_llm_key = codegen.has_api_key(),
            has_oauth_client = oauth.has_client_credentials(),
            frontend_url = %cfg.frontend_url,
            "application state initialized"
        );

        Ok(Arc::new(Self {
            workflow: Coordinator::new(codegen.clone(), deployer.clone()),
            sites: SiteRegistry::new(store, http),
            codegen,
            deployer,
            oauth,
            frontend_url: cfg.frontend_url.trim_end_matches('/').to_string(),
        }))
    }
}

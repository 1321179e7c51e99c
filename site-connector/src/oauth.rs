//! WordPress.com OAuth2 client (authorization-code grant).
//!
//! Endpoints used:
//!   * GET  {authorize_url}?client_id&redirect_uri&response_type=code&state&scope
//!   * POST {token_url} (form-encoded `authorization_code` grant)
//!   * GET  {api_base}/me/sites (Bearer token)
//!
//! Tokens are opaque and never refreshed. Issued `state` values are
//! remembered so the callback can report unknown ones, but they are not
//! enforced. Remembered states expire after [`STATE_TTL`] and at most
//! [`MAX_PENDING_STATES`] are kept; the oldest go first.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::errors::{
    SiteConnectorConfigError, SiteConnectorError, SiteConnectorResult, UpstreamFailure,
};

/// Scope requested on the authorize URL.
pub const OAUTH_SCOPE: &str = "global";

/// Default REST base for the WordPress.com public API.
pub const DEFAULT_WPCOM_API_BASE: &str = "https://public-api.wordpress.com/rest/v1.1";

/// How long an issued state is remembered.
pub const STATE_TTL: Duration = Duration::from_secs(10 * 60);

/// Upper bound on remembered states.
pub const MAX_PENDING_STATES: usize = 1024;

/// OAuth client settings, usually loaded from the environment at startup.
#[derive(Clone, Default)]
pub struct OAuthConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub authorize_url: Option<String>,
    pub token_url: Option<String>,
    /// REST base used for `/me/sites`.
    pub api_base: String,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("redirect_uri", &self.redirect_uri)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Authorize redirect plus the opaque state embedded in it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeUrl {
    pub authorize_url: String,
    pub state: String,
}

/// Access/refresh token pair returned by the token endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenPair { .. }")
    }
}

/// A site visible to the authenticated WordPress.com account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSite {
    pub name: String,
    pub url: String,
    pub id: u64,
}

#[derive(Debug, Deserialize)]
struct MeSitesResponse {
    #[serde(default)]
    sites: Vec<WpComSite>,
}

#[derive(Debug, Deserialize)]
struct WpComSite {
    #[serde(rename = "ID")]
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(rename = "URL")]
    url: String,
}

/// OAuth client with an in-memory record of issued states.
#[derive(Debug)]
pub struct OAuthClient {
    http: Client,
    cfg: OAuthConfig,
    issued_states: Mutex<HashMap<String, Instant>>,
}

impl OAuthClient {
    pub fn new(http: Client, cfg: OAuthConfig) -> Self {
        Self {
            http,
            cfg,
            issued_states: Mutex::new(HashMap::new()),
        }
    }

    /// Whether client id and secret are configured.
    pub fn has_client_credentials(&self) -> bool {
        self.cfg.client_id.is_some() && self.cfg.client_secret.is_some()
    }

    /// Builds the provider authorize URL with a fresh random state.
    pub fn build_authorize_url(&self) -> SiteConnectorResult<AuthorizeUrl> {
        let base = setting(&self.cfg.authorize_url, "WORDPRESS_AUTHORIZE_URL")?;
        let client_id = setting(&self.cfg.client_id, "WORDPRESS_CLIENT_ID")?;
        let redirect_uri = setting(&self.cfg.redirect_uri, "WORDPRESS_REDIRECT_URI")?;

        let state = Uuid::new_v4().simple().to_string();
        let authorize_url = format!(
            "{base}?client_id={}&redirect_uri={}&response_type=code&state={state}&scope={}",
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(OAUTH_SCOPE),
        );

        let now = Instant::now();
        let mut states = self.issued_states.lock().unwrap_or_else(|e| e.into_inner());
        states.retain(|_, issued| now.duration_since(*issued) < STATE_TTL);
        while states.len() >= MAX_PENDING_STATES {
            let Some(oldest) = states
                .iter()
                .min_by_key(|(_, issued)| **issued)
                .map(|(s, _)| s.clone())
            else {
                break;
            };
            states.remove(&oldest);
        }
        states.insert(state.clone(), now);
        debug!(pending = states.len(), "authorize url issued");
        drop(states);

        Ok(AuthorizeUrl {
            authorize_url,
            state,
        })
    }

    /// Consumes a state value; `false` when it was never issued by this
    /// process or has expired.
    pub fn check_state(&self, state: &str) -> bool {
        let known = self
            .issued_states
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(state)
            .is_some_and(|issued| issued.elapsed() < STATE_TTL);
        if !known {
            warn!("oauth callback carried an unknown state value");
        }
        known
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// # Errors
    /// - [`SiteConnectorError::Validation`] when `code` is blank
    /// - [`SiteConnectorError::Config`] when the client is not configured
    /// - [`SiteConnectorError::Upstream`] on transport failure or non-2xx
    pub async fn exchange_code(&self, code: &str) -> SiteConnectorResult<TokenPair> {
        if code.trim().is_empty() {
            return Err(SiteConnectorError::Validation("Code required".into()));
        }
        let token_url = setting(&self.cfg.token_url, "WORDPRESS_TOKEN_URL")?;
        let client_id = setting(&self.cfg.client_id, "WORDPRESS_CLIENT_ID")?;
        let client_secret = setting(&self.cfg.client_secret, "WORDPRESS_CLIENT_SECRET")?;
        let redirect_uri = setting(&self.cfg.redirect_uri, "WORDPRESS_REDIRECT_URI")?;

        let form = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", redirect_uri),
            ("code", code),
            ("grant_type", "authorization_code"),
        ];

        debug!(url = %token_url, "POST token exchange");
        let resp = self
            .http
            .post(token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| upstream_transport("token exchange", &e))?;

        if !resp.status().is_success() {
            let failure = UpstreamFailure::from_response(resp).await;
            error!(status = ?failure.status, "token exchange rejected");
            return Err(SiteConnectorError::Upstream(failure));
        }

        let tokens: TokenPair = resp
            .json()
            .await
            .map_err(|e| upstream_transport("token response decode", &e))?;
        info!("oauth code exchanged");
        Ok(tokens)
    }

    /// Lists the sites of the account behind `bearer`.
    pub async fn list_sites(&self, bearer: &str) -> SiteConnectorResult<Vec<AccountSite>> {
        if bearer.trim().is_empty() {
            return Err(SiteConnectorError::Validation(
                "Missing authorization token".into(),
            ));
        }
        let url = format!("{}/me/sites", self.cfg.api_base.trim_end_matches('/'));
        debug!(%url, "GET account sites");

        let resp = self
            .http
            .get(&url)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| upstream_transport("list sites", &e))?;

        if !resp.status().is_success() {
            let failure = UpstreamFailure::from_response(resp).await;
            error!(status = ?failure.status, "listing account sites failed");
            return Err(SiteConnectorError::Upstream(failure));
        }

        let out: MeSitesResponse = resp
            .json()
            .await
            .map_err(|e| upstream_transport("list sites decode", &e))?;

        Ok(out
            .sites
            .into_iter()
            .map(|s| AccountSite {
                name: s.name,
                url: s.url,
                id: s.id,
            })
            .collect())
    }
}

fn setting<'a>(value: &'a Option<String>, name: &'static str) -> SiteConnectorResult<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| SiteConnectorConfigError::MissingOAuthSetting(name).into())
}

fn upstream_transport(what: &str, e: &reqwest::Error) -> SiteConnectorError {
    error!(error = %e, "{what} failed");
    SiteConnectorError::Upstream(UpstreamFailure::from_transport(e))
}

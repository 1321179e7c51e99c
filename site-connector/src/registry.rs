//! Per-user registry of WordPress sites.
//!
//! Storage is injected through [`SiteStore`] so the backing store can be
//! swapped (tests use [`InMemorySiteStore`]). The registry performs a
//! `load → modify → save` cycle per call without holding a lock across the
//! credential probe, so two concurrent writes for the same user are
//! last-write-wins.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::Duration,
};

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    endpoints::{API_KEY_HEADER, normalize_site_url, require_http_scheme, status_url},
    errors::{SiteConnectorError, SiteConnectorResult},
};

/// Timeout of the credential probe against the plugin status endpoint.
pub const VERIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Name used when the caller does not provide one.
pub const DEFAULT_SITE_NAME: &str = "My WordPress Site";

/// How a site was connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SetupMethod {
    Direct,
    #[serde(rename = "oauth")]
    OAuth,
}

/// A registered site.
///
/// The API key never leaves the process: it is skipped on serialization and
/// redacted from `Debug`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    pub name: String,
    /// Normalized, never ends with `/`.
    pub site_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub setup_method: SetupMethod,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Site")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("site_url", &self.site_url)
            .field("api_key", &"***")
            .field("setup_method", &self.setup_method)
            .field("verified", &self.verified)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Listing entry returned by [`SiteRegistry::list_sites`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSummary {
    pub site_url: String,
    pub created_at: DateTime<Utc>,
}

/// Storage capability used by the registry: whole-list get/put keyed by user id.
pub trait SiteStore: Send + Sync {
    /// Returns the user's sites in insertion order (empty if unknown).
    fn load(&self, user_id: &str) -> Vec<Site>;
    /// Replaces the user's site list.
    fn save(&self, user_id: &str, sites: Vec<Site>);
}

/// Process-local [`SiteStore`].
#[derive(Debug, Default)]
pub struct InMemorySiteStore {
    sites: RwLock<HashMap<String, Vec<Site>>>,
}

impl InMemorySiteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SiteStore for InMemorySiteStore {
    fn load(&self, user_id: &str) -> Vec<Site> {
        let guard = self.sites.read().unwrap_or_else(|e| e.into_inner());
        guard.get(user_id).cloned().unwrap_or_default()
    }

    fn save(&self, user_id: &str, sites: Vec<Site>) {
        let mut guard = self.sites.write().unwrap_or_else(|e| e.into_inner());
        guard.insert(user_id.to_string(), sites);
    }
}

/// Site registry with credential verification.
#[derive(Clone)]
pub struct SiteRegistry {
    store: Arc<dyn SiteStore>,
    http: Client,
}

impl SiteRegistry {
    pub fn new(store: Arc<dyn SiteStore>, http: Client) -> Self {
        Self { store, http }
    }

    /// Registers (or re-keys) a site without contacting it.
    ///
    /// An entry with the same normalized URL gets its API key and timestamp
    /// replaced; otherwise a new entry is appended. Repeating an identical
    /// call leaves a single entry.
    pub fn register(
        &self,
        user_id: &str,
        site_url: &str,
        api_key: &str,
    ) -> SiteConnectorResult<Site> {
        require_present("userId", user_id)?;
        require_present("apiKey", api_key)?;
        let site_url = normalize_site_url(site_url);
        require_http_scheme(&site_url)?;

        let mut sites = self.store.load(user_id);
        let now = Utc::now();

        let site = match sites.iter_mut().find(|s| s.site_url == site_url) {
            Some(existing) => {
                existing.api_key = api_key.to_string();
                existing.created_at = now;
                debug!(user_id, %site_url, "site re-registered");
                existing.clone()
            }
            None => {
                let site = Site {
                    id: Uuid::new_v4().to_string(),
                    name: DEFAULT_SITE_NAME.to_string(),
                    site_url: site_url.clone(),
                    api_key: api_key.to_string(),
                    setup_method: SetupMethod::Direct,
                    verified: false,
                    created_at: now,
                };
                sites.push(site.clone());
                info!(user_id, %site_url, "site registered");
                site
            }
        };

        self.store.save(user_id, sites);
        Ok(site)
    }

    /// Probes the plugin status endpoint with the key, then records the site.
    ///
    /// Single attempt with a 5 second timeout. Any failure (unreachable host,
    /// non-2xx) is reported as [`SiteConnectorError::Auth`] with hints.
    pub async fn verify_and_register(
        &self,
        user_id: &str,
        site_url: &str,
        api_key: &str,
        site_name: Option<&str>,
    ) -> SiteConnectorResult<Site> {
        require_present("userId", user_id)?;
        require_present("siteUrl", site_url)?;
        require_present("apiKey", api_key)?;
        let site_url = normalize_site_url(site_url);
        require_http_scheme(&site_url)?;

        let url = status_url(&site_url);
        debug!(user_id, %url, "verifying site credentials");

        let outcome = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, api_key)
            .timeout(VERIFY_TIMEOUT)
            .send()
            .await;

        let reason = match outcome {
            Ok(resp) if resp.status().is_success() => None,
            Ok(resp) => Some(format!("site answered HTTP {}", resp.status())),
            Err(e) if e.is_timeout() => Some("site did not answer within 5 seconds".to_string()),
            Err(e) => Some(format!("site is unreachable: {e}")),
        };

        if let Some(reason) = reason {
            warn!(user_id, %site_url, %reason, "site verification failed");
            return Err(SiteConnectorError::Auth {
                message: format!("Failed to verify WordPress site: {reason}"),
                hints: verification_hints(),
            });
        }

        let site = Site {
            id: Uuid::new_v4().to_string(),
            name: site_name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or(DEFAULT_SITE_NAME)
                .to_string(),
            site_url,
            api_key: api_key.to_string(),
            setup_method: SetupMethod::Direct,
            verified: true,
            created_at: Utc::now(),
        };

        self.replace_or_append(user_id, site.clone());
        info!(user_id, site_url = %site.site_url, site_id = %site.id, "site verified and registered");
        Ok(site)
    }

    /// Records a site obtained through the OAuth flow.
    ///
    /// The access token stands in for the API key.
    pub fn register_oauth_site(
        &self,
        user_id: &str,
        site_url: &str,
        access_token: &str,
        name: &str,
    ) -> SiteConnectorResult<Site> {
        require_present("userId", user_id)?;
        require_present("accessToken", access_token)?;
        let site_url = normalize_site_url(site_url);
        require_http_scheme(&site_url)?;

        let site = Site {
            id: Uuid::new_v4().to_string(),
            name: if name.trim().is_empty() {
                DEFAULT_SITE_NAME.to_string()
            } else {
                name.trim().to_string()
            },
            site_url,
            api_key: access_token.to_string(),
            setup_method: SetupMethod::OAuth,
            verified: true,
            created_at: Utc::now(),
        };

        self.replace_or_append(user_id, site.clone());
        info!(user_id, site_url = %site.site_url, "oauth site registered");
        Ok(site)
    }

    /// Lists the user's sites without credentials.
    pub fn list_sites(&self, user_id: &str) -> Vec<SiteSummary> {
        self.store
            .load(user_id)
            .into_iter()
            .map(|s| SiteSummary {
                site_url: s.site_url,
                created_at: s.created_at,
            })
            .collect()
    }

    /// The user's most recently registered or re-keyed site, credentials
    /// included. For in-process callers only.
    pub fn latest_site(&self, user_id: &str) -> Option<Site> {
        self.store
            .load(user_id)
            .into_iter()
            .max_by_key(|s| s.created_at)
    }

    #[cfg(test)]
    fn sites(&self, user_id: &str) -> Vec<Site> {
        self.store.load(user_id)
    }

    fn replace_or_append(&self, user_id: &str, site: Site) {
        let mut sites = self.store.load(user_id);
        match sites.iter_mut().find(|s| s.site_url == site.site_url) {
            Some(slot) => *slot = site,
            None => sites.push(site),
        }
        self.store.save(user_id, sites);
    }
}

/// Remediation hints returned when verification fails.
pub fn verification_hints() -> Vec<String> {
    vec![
        "Is the AI Code Deployer plugin installed and activated?".into(),
        "Is the site URL correct (including http:// or https://)?".into(),
        "Is the API key copied exactly from the plugin settings page?".into(),
        "Is the site reachable from this server?".into(),
    ]
}

fn require_present(field: &str, value: &str) -> SiteConnectorResult<()> {
    if value.trim().is_empty() {
        Err(SiteConnectorError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

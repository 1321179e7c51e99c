use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use site_connector::{Site, SiteSummary};

/// Request payload for POST /wordpress/register.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub site_url: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub site: Site,
}

#[derive(Debug, Serialize)]
pub struct SitesResponse {
    pub sites: Vec<SiteSummary>,
}

/// Request payload for POST /setup/direct.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupDirectRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub site_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub site_name: Option<String>,
}

/// Request payload for POST /setup/oauth.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupOAuthRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub site_url: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub name: String,
}

/// Public view of a freshly verified site.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteView {
    pub id: String,
    pub name: String,
    pub site_url: String,
    pub created_at: DateTime<Utc>,
}

impl From<Site> for SiteView {
    fn from(s: Site) -> Self {
        Self {
            id: s.id,
            name: s.name,
            site_url: s.site_url,
            created_at: s.created_at,
        }
    }
}

/// Response of both setup routes.
#[derive(Debug, Serialize)]
pub struct SetupResponse {
    pub site: SiteView,
}

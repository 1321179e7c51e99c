use serde::{Deserialize, Serialize};
use site_connector::AccountSite;

/// Query string of the provider redirect to `/auth/callback`.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Request payload for POST /oauth/token.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub code: String,
}

/// Response payload for GET /list-wordpress-sites.
#[derive(Debug, Serialize)]
pub struct ListSitesResponse {
    pub sites: Vec<AccountSite>,
}

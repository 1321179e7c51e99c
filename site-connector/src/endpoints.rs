//! REST paths exposed by the companion WordPress plugin.
//!
//! Endpoints used:
//!   * GET  /wp-json/ai-code-deployer/v1/status
//!   * POST /wp-json/ai-code-deployer/v1/deploy
//!   * POST /wp-json/ai-code-deployer/v1/deploy-batch

use crate::errors::{SiteConnectorError, SiteConnectorResult};

/// REST namespace registered by the plugin.
pub const PLUGIN_NAMESPACE: &str = "/wp-json/ai-code-deployer/v1";

/// Header carrying the per-site API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Strips surrounding whitespace and every trailing `/`.
///
/// Idempotent: normalizing an already normalized URL returns it unchanged.
pub fn normalize_site_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Ensures the URL uses an http(s) scheme.
pub fn require_http_scheme(url: &str) -> SiteConnectorResult<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(SiteConnectorError::Validation(
            "siteUrl must start with http:// or https://".into(),
        ))
    }
}

pub fn status_url(site_url: &str) -> String {
    format!("{}{PLUGIN_NAMESPACE}/status", normalize_site_url(site_url))
}

pub fn deploy_url(site_url: &str) -> String {
    format!("{}{PLUGIN_NAMESPACE}/deploy", normalize_site_url(site_url))
}

pub fn deploy_batch_url(site_url: &str) -> String {
    format!("{}{PLUGIN_NAMESPACE}/deploy-batch", normalize_site_url(site_url))
}

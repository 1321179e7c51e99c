//! Site registry routes:
//!   * POST /wordpress/register
//!   * GET  /wordpress/sites/{userId}
//!   * POST /setup/direct
//!   * POST /setup/oauth

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::{
    core::{app_state::AppState, http::response_envelope::Success},
    error_handler::AppResult,
    routes::wordpress::wordpress_dto::{
        RegisterRequest, RegisterResponse, SetupDirectRequest, SetupOAuthRequest, SetupResponse,
        SitesResponse,
    },
};

/// Records a site without contacting it.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Json<Success<RegisterResponse>>> {
    let site = state
        .sites
        .register(&body.user_id, &body.site_url, &body.api_key)?;
    Ok(Json(Success::new(RegisterResponse { site })))
}

pub async fn list_sites(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Json<SitesResponse> {
    Json(SitesResponse {
        sites: state.sites.list_sites(&user_id),
    })
}

/// Verifies the plugin API key against the site, then records it.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:5000/setup/direct \
///   -H 'content-type: application/json' \
///   -d '{"userId":"u1","siteUrl":"https://shop.example","apiKey":"..."}'
/// ```
#[instrument(skip_all, fields(user_id = %body.user_id))]
pub async fn setup_direct(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetupDirectRequest>,
) -> AppResult<Json<Success<SetupResponse>>> {
    let site = state
        .sites
        .verify_and_register(
            &body.user_id,
            &body.site_url,
            &body.api_key,
            body.site_name.as_deref(),
        )
        .await?;
    Ok(Json(Success::new(SetupResponse { site: site.into() })))
}

/// Records a site picked from the WordPress.com account after the OAuth
/// token exchange. The access token is kept as the site credential.
#[instrument(skip_all, fields(user_id = %body.user_id))]
pub async fn setup_oauth(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetupOAuthRequest>,
) -> AppResult<Json<Success<SetupResponse>>> {
    let site = state.sites.register_oauth_site(
        &body.user_id,
        &body.site_url,
        &body.access_token,
        &body.name,
    )?;
    Ok(Json(Success::new(SetupResponse { site: site.into() })))
}

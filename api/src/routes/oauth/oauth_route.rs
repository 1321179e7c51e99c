//! WordPress.com OAuth routes:
//!   * GET  /oauth/authorize-url
//!   * GET  /auth/callback?code&state
//!   * POST /oauth/token
//!   * GET  /list-wordpress-sites

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use site_connector::{AuthorizeUrl, SiteConnectorError, TokenPair};
use tracing::{info, instrument};

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    routes::oauth::oauth_dto::{CallbackQuery, ListSitesResponse, TokenRequest},
};

pub async fn authorize_url(State(state): State<Arc<AppState>>) -> AppResult<Json<AuthorizeUrl>> {
    Ok(Json(state.oauth.build_authorize_url()?))
}

/// Sends the browser back to the frontend with `code` and `state`, or with
/// `error=no_code` when the provider did not return a code.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(q): Query<CallbackQuery>,
) -> Response {
    let target = match q.code.as_deref().filter(|c| !c.is_empty()) {
        None => format!("{}?error=no_code", state.frontend_url),
        Some(code) => {
            let oauth_state = q.state.as_deref().unwrap_or_default();
            // Unknown states are logged by the client and still forwarded.
            state.oauth.check_state(oauth_state);
            format!(
                "{}?code={}&state={}",
                state.frontend_url,
                urlencoding::encode(code),
                urlencoding::encode(oauth_state)
            )
        }
    };
    (StatusCode::FOUND, [(header::LOCATION, target)]).into_response()
}

#[instrument(skip_all)]
pub async fn token(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TokenRequest>,
) -> AppResult<Json<TokenPair>> {
    let tokens = state
        .oauth
        .exchange_code(&body.code)
        .await
        .map_err(|e| match e {
            SiteConnectorError::Upstream(f) => AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "TOKEN_EXCHANGE_FAILED",
                message: "Failed to get access token".into(),
                details: f.body,
            },
            other => other.into(),
        })?;
    info!("access token issued");
    Ok(Json(tokens))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).trim())
        .filter(|t| !t.is_empty())
}

pub async fn list_wordpress_sites(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<ListSitesResponse>> {
    let token = bearer_token(&headers)
        .ok_or_else(|| AppError::BadRequest("Missing authorization token".into()))?;
    let sites = state.oauth.list_sites(token).await?;
    Ok(Json(ListSitesResponse { sites }))
}

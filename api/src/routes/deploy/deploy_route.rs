//! Deployment routes:
//!   * POST /deploy-code
//!   * POST /deploy-codes
//!   * POST /review-to-deploy

use std::sync::Arc;

use axum::{Json, extract::State};
use tracing::{debug, instrument};

use crate::{
    core::{app_state::AppState, http::response_envelope::Success},
    error_handler::AppResult,
    routes::deploy::deploy_dto::{
        DeployCodeRequest, DeployCodesRequest, DeploymentResponse, ReviewToDeployRequest,
        ReviewToDeployResponse,
    },
};

#[instrument(skip_all, fields(code_type = %body.code_type))]
pub async fn deploy_code(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DeployCodeRequest>,
) -> AppResult<Json<Success<DeploymentResponse>>> {
    let deployment = state
        .deployer
        .deploy_single(&body.site_url, &body.api_key, &body.code, &body.code_type)
        .await?;
    Ok(Json(Success::new(DeploymentResponse { deployment })))
}

#[instrument(skip_all, fields(count = body.deployments.len()))]
pub async fn deploy_codes(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DeployCodesRequest>,
) -> AppResult<Json<Success<DeploymentResponse>>> {
    let deployment = state
        .deployer
        .deploy_batch(&body.site_url, &body.api_key, &body.deployments)
        .await?;
    Ok(Json(Success::new(DeploymentResponse { deployment })))
}

/// Runs review → prompt → code → deploy in one request.
///
/// When both `siteUrl` and `apiKey` are omitted, the user's most recently
/// registered site is used.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:5000/review-to-deploy \
///   -H 'content-type: application/json' \
///   -d '{"review":"Button too small","siteUrl":"https://shop.example","apiKey":"...","userId":"u1"}'
/// ```
pub async fn review_to_deploy(
    State(state): State<Arc<AppState>>,
    Json(mut body): Json<ReviewToDeployRequest>,
) -> AppResult<Json<Success<ReviewToDeployResponse>>> {
    if body.site_url.trim().is_empty() && body.api_key.trim().is_empty() {
        if let Some(site) = state.sites.latest_site(&body.user_id) {
            debug!(user_id = %body.user_id, site_url = %site.site_url, "using registered site");
            body.site_url = site.site_url;
            body.api_key = site.api_key;
        }
    }
    let pipeline = state
        .workflow
        .review_to_deploy(&body.review, &body.site_url, &body.api_key, &body.user_id)
        .await?;
    Ok(Json(Success::new(ReviewToDeployResponse { pipeline })))
}

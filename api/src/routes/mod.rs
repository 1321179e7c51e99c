use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::app_state::AppState;

pub mod deploy;
pub mod generate;
pub mod health_route;
pub mod oauth;
pub mod wordpress;
pub mod workflow;

use deploy::deploy_route::{deploy_code, deploy_codes, review_to_deploy};
use generate::generate_route::{generate_code, generate_prompt};
use health_route::health;
use oauth::oauth_route::{authorize_url, callback, list_wordpress_sites, token};
use wordpress::wordpress_route::{list_sites, register, setup_direct, setup_oauth};
use workflow::workflow_route as wf;

/// All routes, relative to the mount point.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        // OAuth
        .route("/oauth/authorize-url", get(authorize_url))
        .route("/auth/callback", get(callback))
        .route("/oauth/token", post(token))
        .route("/list-wordpress-sites", get(list_wordpress_sites))
        // Site registry
        .route("/wordpress/register", post(register))
        .route("/wordpress/sites/{user_id}", get(list_sites))
        .route("/setup/direct", post(setup_direct))
        .route("/setup/oauth", post(setup_oauth))
        // Generation and deployment
        .route("/generate-prompt", post(generate_prompt))
        .route("/generate-code", post(generate_code))
        .route("/deploy-code", post(deploy_code))
        .route("/deploy-codes", post(deploy_codes))
        .route("/review-to-deploy", post(review_to_deploy))
        // Workflow
        .route("/reviews", get(wf::list_reviews).post(wf::add_review))
        .route("/reviews/selected", get(wf::selected_review))
        .route("/reviews/{id}", get(wf::get_review).delete(wf::delete_review))
        .route("/reviews/{id}/select", post(wf::select_review))
        .route("/reviews/{id}/generate-prompt", post(wf::generate_prompt))
        .route("/reviews/{id}/prompt-draft", put(wf::update_prompt_draft))
        .route("/reviews/{id}/generate-code", post(wf::generate_code))
        .route("/reviews/{id}/deploy", post(wf::deploy_review))
        .route("/deployments", get(wf::deployments))
        .route("/stats", get(wf::stats))
}

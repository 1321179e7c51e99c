//! Workflow routes backing the review dashboard: reviews, their stages,
//! deployment history and counters.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use review_workflow::WorkflowStats;

use crate::{
    core::{app_state::AppState, http::response_envelope::Success},
    error_handler::AppResult,
    routes::workflow::workflow_dto::{
        AddReviewRequest, DeployReviewRequest, DeployReviewResponse, DeploymentsResponse, Empty,
        PromptDraftRequest, ReviewResponse, ReviewsResponse, SelectedReviewResponse,
    },
};

type Shared = State<Arc<AppState>>;

pub async fn list_reviews(State(state): Shared) -> Json<ReviewsResponse> {
    Json(ReviewsResponse {
        reviews: state.workflow.list_reviews().await,
    })
}

pub async fn add_review(
    State(state): Shared,
    Json(body): Json<AddReviewRequest>,
) -> AppResult<Json<Success<ReviewResponse>>> {
    let review = state
        .workflow
        .add_review(&body.text, body.source.as_deref())
        .await?;
    Ok(Json(Success::new(ReviewResponse { review })))
}

pub async fn get_review(State(state): Shared, Path(id): Path<u64>) -> AppResult<Json<ReviewResponse>> {
    let review = state.workflow.get_review(id).await?;
    Ok(Json(ReviewResponse { review }))
}

pub async fn delete_review(State(state): Shared, Path(id): Path<u64>) -> AppResult<Json<Success<Empty>>> {
    state.workflow.delete_review(id).await?;
    Ok(Json(Success::new(Empty {})))
}

pub async fn select_review(
    State(state): Shared,
    Path(id): Path<u64>,
) -> AppResult<Json<ReviewResponse>> {
    let review = state.workflow.select_review(id).await?;
    Ok(Json(ReviewResponse { review }))
}

pub async fn selected_review(State(state): Shared) -> Json<SelectedReviewResponse> {
    Json(SelectedReviewResponse {
        review: state.workflow.selected().await,
    })
}

pub async fn generate_prompt(
    State(state): Shared,
    Path(id): Path<u64>,
) -> AppResult<Json<ReviewResponse>> {
    let review = state.workflow.generate_prompt(id).await?;
    Ok(Json(ReviewResponse { review }))
}

pub async fn update_prompt_draft(
    State(state): Shared,
    Path(id): Path<u64>,
    Json(body): Json<PromptDraftRequest>,
) -> AppResult<Json<ReviewResponse>> {
    let review = state
        .workflow
        .update_prompt_draft(id, &body.prompt_draft)
        .await?;
    Ok(Json(ReviewResponse { review }))
}

pub async fn generate_code(
    State(state): Shared,
    Path(id): Path<u64>,
) -> AppResult<Json<ReviewResponse>> {
    let review = state.workflow.generate_code(id).await?;
    Ok(Json(ReviewResponse { review }))
}

pub async fn deploy_review(
    State(state): Shared,
    Path(id): Path<u64>,
    Json(body): Json<DeployReviewRequest>,
) -> AppResult<Json<Success<DeployReviewResponse>>> {
    let outcome = state
        .workflow
        .deploy_review(id, &body.site_url, &body.api_key, body.code_type.as_deref())
        .await?;
    Ok(Json(Success::new(DeployReviewResponse {
        record: outcome.record,
        deployment: outcome.deployment,
    })))
}

pub async fn deployments(State(state): Shared) -> Json<DeploymentsResponse> {
    Json(DeploymentsResponse {
        deployments: state.workflow.deployments().await,
    })
}

pub async fn stats(State(state): Shared) -> Json<WorkflowStats> {
    Json(state.workflow.stats().await)
}

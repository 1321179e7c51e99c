//! POST /generate-prompt and POST /generate-code

use std::sync::Arc;

use ai_llm_service::CodeArtifact;
use axum::{Json, extract::State};

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    routes::generate::generate_dto::{
        GenerateCodeRequest, GeneratePromptRequest, GeneratePromptResponse,
    },
};

/// Turns review text into an implementation prompt.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:5000/generate-prompt \
///   -H 'content-type: application/json' \
///   -d '{"review":"The checkout button is too small on mobile"}'
/// ```
pub async fn generate_prompt(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GeneratePromptRequest>,
) -> AppResult<Json<GeneratePromptResponse>> {
    let prompt = state.codegen.generate_prompt(&body.review).await?;
    Ok(Json(GeneratePromptResponse { prompt }))
}

/// Turns a prompt into `{code, code_type, description}`.
pub async fn generate_code(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateCodeRequest>,
) -> AppResult<Json<CodeArtifact>> {
    Ok(Json(state.codegen.generate_code(&body.prompt).await?))
}

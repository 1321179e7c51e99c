use review_workflow::{DeploymentRecord, Review};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct AddReviewRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDraftRequest {
    #[serde(default)]
    pub prompt_draft: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployReviewRequest {
    #[serde(default)]
    pub site_url: String,
    #[serde(default)]
    pub api_key: String,
    /// Overrides the type declared with the generated code.
    #[serde(default)]
    pub code_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewsResponse {
    pub reviews: Vec<Review>,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub review: Review,
}

#[derive(Debug, Serialize)]
pub struct SelectedReviewResponse {
    pub review: Option<Review>,
}

#[derive(Debug, Serialize)]
pub struct DeployReviewResponse {
    pub record: DeploymentRecord,
    /// Upstream answer of the site plugin.
    pub deployment: Value,
}

#[derive(Debug, Serialize)]
pub struct DeploymentsResponse {
    pub deployments: Vec<DeploymentRecord>,
}

#[derive(Debug, Serialize)]
pub struct Empty {}

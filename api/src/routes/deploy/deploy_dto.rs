use review_workflow::PipelineOutcome;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use site_connector::DeployItem;

/// Request payload for POST /deploy-code.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployCodeRequest {
    #[serde(default)]
    pub site_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub code_type: String,
}

/// Request payload for POST /deploy-codes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployCodesRequest {
    #[serde(default)]
    pub site_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub deployments: Vec<DeployItem>,
}

/// Upstream answer of the site plugin, forwarded verbatim.
#[derive(Debug, Serialize)]
pub struct DeploymentResponse {
    pub deployment: Value,
}

/// Request payload for POST /review-to-deploy.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewToDeployRequest {
    #[serde(default)]
    pub review: String,
    #[serde(default)]
    pub site_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewToDeployResponse {
    pub pipeline: PipelineOutcome,
}

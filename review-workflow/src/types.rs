use ai_llm_service::CodeArtifact;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Source recorded when the caller does not name one.
pub const DEFAULT_REVIEW_SOURCE: &str = "test";

/// Workflow stage of a review. Ordering follows the stage sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReviewStatus {
    New,
    PromptGenerated,
    CodeGenerated,
    Deployed,
}

/// Code attached to a review once generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCode {
    pub code: String,
    pub code_type: String,
    pub description: String,
}

impl From<CodeArtifact> for GeneratedCode {
    fn from(a: CodeArtifact) -> Self {
        Self {
            code: a.code,
            code_type: a.code_type,
            description: a.description,
        }
    }
}

/// A piece of customer feedback moving through the workflow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Creation time in milliseconds, bumped on collision.
    pub id: u64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub source: String,
    pub status: ReviewStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_draft: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_code: Option<GeneratedCode>,
}

impl Review {
    /// Moves the status forward; never regresses it.
    pub(crate) fn advance(&mut self, to: ReviewStatus) {
        if to > self.status {
            self.status = to;
        }
    }

    /// Draft if present, otherwise the generated prompt.
    pub fn effective_prompt(&self) -> Option<&str> {
        self.prompt_draft
            .as_deref()
            .or(self.generated_prompt.as_deref())
            .filter(|p| !p.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Success,
}

/// Append-only history entry for a successful deployment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub id: String,
    pub deployed_at: DateTime<Utc>,
    pub status: DeploymentStatus,
    pub site_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_id: Option<u64>,
    pub code_type: String,
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStats {
    pub total: usize,
    /// Reviews not yet deployed.
    pub pending: usize,
    /// Reviews that carry generated code.
    pub generated: usize,
    /// `generated / total` as a rounded percentage, 0 when empty.
    pub success_rate: u32,
}

/// Outcome of a deploy stage: the recorded entry plus the site's answer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployOutcome {
    pub record: DeploymentRecord,
    pub deployment: Value,
}

/// Result of the one-shot review-to-deploy pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutcome {
    pub review_id: u64,
    pub prompt: String,
    pub code: String,
    pub code_type: String,
    pub description: String,
    pub deployment: Value,
}

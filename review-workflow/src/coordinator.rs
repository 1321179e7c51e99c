//! Workflow coordinator: owns the review board and drives each stage.
//!
//! The board (reviews, selected review, deployment history) sits behind one
//! `tokio::sync::Mutex`. Stages read their input under the lock, release it
//! for the outbound call and re-acquire it to store the result, so a review
//! deleted in the meantime yields `NotFound` instead of being resurrected.

use ai_llm_service::CodeGenClient;
use chrono::Utc;
use site_connector::{DeploymentClient, endpoints::normalize_site_url};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    errors::{WorkflowError, WorkflowResult},
    types::{
        DEFAULT_REVIEW_SOURCE, DeployOutcome, DeploymentRecord, DeploymentStatus, GeneratedCode,
        PipelineOutcome, Review, ReviewStatus, WorkflowStats,
    },
};

#[derive(Debug, Default)]
struct Board {
    /// Newest first.
    reviews: Vec<Review>,
    selected: Option<Review>,
    /// Newest first.
    deployments: Vec<DeploymentRecord>,
    last_id: u64,
}

impl Board {
    fn next_id(&mut self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        self.last_id = now.max(self.last_id + 1);
        self.last_id
    }

    fn get(&self, id: u64) -> WorkflowResult<&Review> {
        self.reviews
            .iter()
            .find(|r| r.id == id)
            .ok_or(WorkflowError::NotFound(id))
    }

    /// Applies `f` to the stored review and mirrors the result into the
    /// selected view when it refers to the same id.
    fn update<F>(&mut self, id: u64, f: F) -> WorkflowResult<Review>
    where
        F: FnOnce(&mut Review),
    {
        let review = self
            .reviews
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(WorkflowError::NotFound(id))?;
        f(review);
        let updated = review.clone();
        if self.selected.as_ref().is_some_and(|s| s.id == id) {
            self.selected = Some(updated.clone());
        }
        Ok(updated)
    }
}

/// Drives reviews through `new → promptGenerated → codeGenerated → deployed`.
#[derive(Debug)]
pub struct Coordinator {
    codegen: CodeGenClient,
    deployer: DeploymentClient,
    board: Mutex<Board>,
}

impl Coordinator {
    pub fn new(codegen: CodeGenClient, deployer: DeploymentClient) -> Self {
        Self {
            codegen,
            deployer,
            board: Mutex::new(Board::default()),
        }
    }

    pub async fn add_review(&self, text: &str, source: Option<&str>) -> WorkflowResult<Review> {
        if text.trim().is_empty() {
            return Err(WorkflowError::Validation("Review text required".into()));
        }
        let mut board = self.board.lock().await;
        let review = Review {
            id: board.next_id(),
            text: text.to_string(),
            created_at: Utc::now(),
            source: source
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(DEFAULT_REVIEW_SOURCE)
                .to_string(),
            status: ReviewStatus::New,
            generated_prompt: None,
            prompt_draft: None,
            generated_code: None,
        };
        board.reviews.insert(0, review.clone());
        info!(review_id = review.id, source = %review.source, "review added");
        Ok(review)
    }

    /// All reviews, newest first.
    pub async fn list_reviews(&self) -> Vec<Review> {
        self.board.lock().await.reviews.clone()
    }

    pub async fn get_review(&self, id: u64) -> WorkflowResult<Review> {
        self.board.lock().await.get(id).cloned()
    }

    /// Removes a review; clears the selection when it pointed at it.
    pub async fn delete_review(&self, id: u64) -> WorkflowResult<()> {
        let mut board = self.board.lock().await;
        let before = board.reviews.len();
        board.reviews.retain(|r| r.id != id);
        if board.reviews.len() == before {
            return Err(WorkflowError::NotFound(id));
        }
        if board.selected.as_ref().is_some_and(|s| s.id == id) {
            board.selected = None;
        }
        info!(review_id = id, "review deleted");
        Ok(())
    }

    /// Makes `id` the selected review. The draft defaults to the generated prompt.
    pub async fn select_review(&self, id: u64) -> WorkflowResult<Review> {
        let mut board = self.board.lock().await;
        let review = board.update(id, |r| {
            if r.prompt_draft.is_none() {
                r.prompt_draft = r.generated_prompt.clone();
            }
        })?;
        board.selected = Some(review.clone());
        Ok(review)
    }

    pub async fn selected(&self) -> Option<Review> {
        self.board.lock().await.selected.clone()
    }

    /// Generates the implementation prompt and stores it as prompt and draft.
    #[instrument(skip(self))]
    pub async fn generate_prompt(&self, id: u64) -> WorkflowResult<Review> {
        let text = self.board.lock().await.get(id)?.text.clone();

        let prompt = self.codegen.generate_prompt(&text).await?;

        self.board.lock().await.update(id, |r| {
            r.generated_prompt = Some(prompt.clone());
            r.prompt_draft = Some(prompt);
            r.advance(ReviewStatus::PromptGenerated);
        })
    }

    /// Replaces the prompt draft. Previously generated code is kept.
    pub async fn update_prompt_draft(&self, id: u64, draft: &str) -> WorkflowResult<Review> {
        self.board
            .lock()
            .await
            .update(id, |r| r.prompt_draft = Some(draft.to_string()))
    }

    /// Generates code from the current prompt draft.
    #[instrument(skip(self))]
    pub async fn generate_code(&self, id: u64) -> WorkflowResult<Review> {
        let prompt = {
            let board = self.board.lock().await;
            board
                .get(id)?
                .effective_prompt()
                .map(str::to_string)
                .ok_or_else(|| {
                    WorkflowError::Validation("Please refine the prompt first".into())
                })?
        };

        let artifact = self.codegen.generate_code(&prompt).await?;

        self.board.lock().await.update(id, |r| {
            r.generated_code = Some(GeneratedCode::from(artifact));
            r.advance(ReviewStatus::CodeGenerated);
        })
    }

    /// Deploys the review's generated code and records the deployment.
    ///
    /// `code_type` overrides the type declared by the model.
    #[instrument(skip(self, api_key))]
    pub async fn deploy_review(
        &self,
        id: u64,
        site_url: &str,
        api_key: &str,
        code_type: Option<&str>,
    ) -> WorkflowResult<DeployOutcome> {
        let code = self
            .board
            .lock()
            .await
            .get(id)?
            .generated_code
            .clone()
            .ok_or_else(|| WorkflowError::Validation("Please generate code first".into()))?;

        let code_type = code_type
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(code.code_type.as_str())
            .to_ascii_lowercase();

        let deployment = self
            .deployer
            .deploy_single(site_url, api_key, &code.code, &code_type)
            .await?;

        let record = DeploymentRecord {
            id: Uuid::new_v4().to_string(),
            deployed_at: Utc::now(),
            status: DeploymentStatus::Success,
            site_url: normalize_site_url(site_url),
            review_id: Some(id),
            code_type,
        };

        let mut board = self.board.lock().await;
        board.deployments.insert(0, record.clone());
        if let Err(e) = board.update(id, |r| r.advance(ReviewStatus::Deployed)) {
            warn!(review_id = id, error = %e, "review removed while deploying");
        }
        info!(review_id = id, deployment_id = %record.id, "review deployed");

        Ok(DeployOutcome { record, deployment })
    }

    /// Deployment history, newest first.
    pub async fn deployments(&self) -> Vec<DeploymentRecord> {
        self.board.lock().await.deployments.clone()
    }

    pub async fn stats(&self) -> WorkflowStats {
        let board = self.board.lock().await;
        let total = board.reviews.len();
        let pending = board
            .reviews
            .iter()
            .filter(|r| r.status != ReviewStatus::Deployed)
            .count();
        let generated = board
            .reviews
            .iter()
            .filter(|r| r.generated_code.is_some())
            .count();
        let success_rate = if total == 0 {
            0
        } else {
            ((generated as f64 / total as f64) * 100.0).round() as u32
        };
        WorkflowStats {
            total,
            pending,
            generated,
            success_rate,
        }
    }

    /// Runs add → prompt → code → deploy in sequence.
    ///
    /// Stops at the first failure; stages already completed stay recorded on
    /// the review so the workflow can be resumed from there. `user_id` only
    /// tags the log line; callers resolve a registered site for the user
    /// before calling.
    #[instrument(skip(self, review, api_key), fields(review_len = review.len()))]
    pub async fn review_to_deploy(
        &self,
        review: &str,
        site_url: &str,
        api_key: &str,
        user_id: &str,
    ) -> WorkflowResult<PipelineOutcome> {
        let mut missing = Vec::new();
        for (name, value) in [("review", review), ("siteUrl", site_url), ("apiKey", api_key)] {
            if value.trim().is_empty() {
                missing.push(name);
            }
        }
        if !missing.is_empty() {
            return Err(WorkflowError::Validation(format!(
                "Missing required parameters: {}",
                missing.join(", ")
            )));
        }

        let added = self.add_review(review, Some("api")).await?;
        let id = added.id;

        let with_prompt = self.generate_prompt(id).await?;
        let with_code = self.generate_code(id).await?;
        let outcome = self.deploy_review(id, site_url, api_key, None).await?;

        let code = with_code.generated_code.unwrap_or_else(|| GeneratedCode {
            code: String::new(),
            code_type: outcome.record.code_type.clone(),
            description: String::new(),
        });

        info!(review_id = id, user_id, "review-to-deploy pipeline completed");
        Ok(PipelineOutcome {
            review_id: id,
            prompt: with_prompt.generated_prompt.unwrap_or_default(),
            code: code.code,
            code_type: code.code_type,
            description: code.description,
            deployment: outcome.deployment,
        })
    }
}

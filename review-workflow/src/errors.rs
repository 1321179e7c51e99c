use ai_llm_service::AiLlmError;
use site_connector::SiteConnectorError;
use thiserror::Error;

pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WorkflowError {
    /// A stage was requested before its input exists, or input is blank.
    #[error("{0}")]
    Validation(String),

    #[error("Review {0} not found")]
    NotFound(u64),

    /// Prompt or code generation failed.
    #[error(transparent)]
    Llm(#[from] AiLlmError),

    /// Deployment or site validation failed.
    #[error(transparent)]
    Site(#[from] SiteConnectorError),
}

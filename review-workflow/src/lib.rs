//! Review workflow: reviews move through prompt and code generation to a
//! deployment, with the selected review and deployment history kept
//! alongside.

pub mod coordinator;
mod errors;
pub mod types;

pub use coordinator::Coordinator;
pub use errors::{WorkflowError, WorkflowResult};
pub use types::{
    DeployOutcome, DeploymentRecord, DeploymentStatus, GeneratedCode, PipelineOutcome, Review,
    ReviewStatus, WorkflowStats,
};

//! Gemini-backed code generation: review → implementation prompt → code artifact.

pub mod codegen;
pub mod config;
pub mod error_handler;
pub mod extract;
pub mod services;

pub use codegen::CodeGenClient;
pub use config::gemini_config::{GeminiConfig, GenerationOptions};
pub use error_handler::{AiLlmError, ParseError, ProviderError};
pub use extract::{CodeArtifact, extract_structured};
pub use services::gemini_service::GeminiService;

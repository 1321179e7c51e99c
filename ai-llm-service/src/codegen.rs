//! Review → prompt → code generation on top of [`GeminiService`].
//!
//! Each operation validates its input, concatenates a fixed instruction with
//! the caller's text and issues exactly one upstream request. Nothing is retried.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::{
    config::gemini_config::GenerationOptions,
    error_handler::{AiLlmError, Result},
    extract::{CodeArtifact, extract_structured},
    services::gemini_service::GeminiService,
};

/// Preamble for turning customer feedback into an implementation prompt.
const PROMPT_PREAMBLE: &str = "Create an actionable implementation prompt from this review. \
Describe the concrete front-end change (CSS, JavaScript or HTML) a WordPress site needs \
to address it.\n\nReview:\n";

/// Rules prepended to the user prompt when generating code.
const CODE_RULES: &str = "Generate production-ready code for a WordPress site.\n\
Rules:\n\
- Use only one of: CSS, JavaScript or HTML.\n\
- Do not include PHP.\n\
- Answer with a single fenced ```json block and nothing else inside it.\n\
- The JSON object must have exactly these fields:\n\
  {\"code\": \"<the code>\", \"code_type\": \"css\" | \"js\" | \"html\", \"description\": \"<one sentence>\"}\n\
\nPrompt:\n";

/// Builds the full request text for [`CodeGenClient::generate_prompt`].
pub fn prompt_request_text(review: &str) -> String {
    format!("{PROMPT_PREAMBLE}\"{review}\"")
}

/// Builds the full request text for [`CodeGenClient::generate_code`].
pub fn code_request_text(prompt: &str) -> String {
    format!("{CODE_RULES}{prompt}")
}

/// Code-generation client shared by the HTTP layer and the workflow.
#[derive(Debug, Clone)]
pub struct CodeGenClient {
    llm: Arc<GeminiService>,
}

impl CodeGenClient {
    pub fn new(llm: Arc<GeminiService>) -> Self {
        Self { llm }
    }

    /// Whether the underlying service has an API key configured.
    pub fn has_api_key(&self) -> bool {
        self.llm.has_api_key()
    }

    /// Turns review text into an implementation prompt.
    ///
    /// Returns an empty string when the upstream answers without candidates.
    ///
    /// # Errors
    /// - [`AiLlmError::Validation`] if `review` is blank (no upstream call is made)
    /// - [`AiLlmError::Provider`] / [`AiLlmError::HttpTransport`] on upstream failure
    #[instrument(name = "generate_prompt", skip_all, fields(review_len = review.len()))]
    pub async fn generate_prompt(&self, review: &str) -> Result<String> {
        if review.trim().is_empty() {
            return Err(AiLlmError::Validation("Review required"));
        }

        let prompt = self
            .llm
            .generate(&prompt_request_text(review), GenerationOptions::PROMPT)
            .await?;

        info!(prompt_len = prompt.len(), "implementation prompt generated");
        Ok(prompt)
    }

    /// Turns an implementation prompt into a code artifact.
    ///
    /// # Errors
    /// - [`AiLlmError::Validation`] if `prompt` is blank (no upstream call is made)
    /// - [`AiLlmError::Provider`] / [`AiLlmError::HttpTransport`] on upstream failure
    /// - [`AiLlmError::Parse`] if the model output holds no decodable code object
    #[instrument(name = "generate_code", skip_all, fields(prompt_len = prompt.len()))]
    pub async fn generate_code(&self, prompt: &str) -> Result<CodeArtifact> {
        if prompt.trim().is_empty() {
            return Err(AiLlmError::Validation("Prompt required"));
        }

        let raw = self
            .llm
            .generate(&code_request_text(prompt), GenerationOptions::CODE)
            .await?;

        let artifact = extract_structured(&raw)?;
        info!(
            code_type = %artifact.code_type,
            code_len = artifact.code.len(),
            "code artifact generated"
        );
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
    use serde_json::{Value, json};

    use super::*;
    use crate::config::gemini_config::GeminiConfig;

    #[derive(Clone)]
    struct Stub {
        hits: Arc<AtomicUsize>,
        status: StatusCode,
        body: Value,
        seen: Arc<std::sync::Mutex<Vec<Value>>>,
    }

    async fn handler(State(stub): State<Stub>, Json(req): Json<Value>) -> (StatusCode, Json<Value>) {
        stub.hits.fetch_add(1, Ordering::SeqCst);
        stub.seen.lock().unwrap().push(req);
        (stub.status, Json(stub.body.clone()))
    }

    async fn spawn_stub(status: StatusCode, body: Value) -> (String, Stub) {
        let stub = Stub {
            hits: Arc::new(AtomicUsize::new(0)),
            status,
            body,
            seen: Arc::new(std::sync::Mutex::new(Vec::new())),
        };
        let app = Router::new()
            .route("/v1beta/models/{model}", post(handler))
            .with_state(stub.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), stub)
    }

    fn client(endpoint: String) -> CodeGenClient {
        let cfg = GeminiConfig {
            api_key: Some("test-key".into()),
            model: "gemini-test".into(),
            endpoint,
            timeout_secs: Some(5),
        };
        CodeGenClient::new(Arc::new(GeminiService::new(cfg).unwrap()))
    }

    fn candidate(text: &str) -> Value {
        json!({"candidates":[{"content":{"parts":[{"text": text}]}}]})
    }

    #[tokio::test]
    async fn prompt_is_first_candidate_text_after_one_call() {
        let (url, stub) = spawn_stub(StatusCode::OK, candidate("Increase button size")).await;
        let out = client(url).generate_prompt("button too small").await.unwrap();
        assert_eq!(out, "Increase button size");
        assert_eq!(stub.hits.load(Ordering::SeqCst), 1);

        let seen = stub.seen.lock().unwrap();
        let text = seen[0]["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.contains("button too small"));
        assert_eq!(seen[0]["generationConfig"]["maxOutputTokens"], 1024);
    }

    #[tokio::test]
    async fn no_candidates_gives_empty_prompt() {
        let (url, _) = spawn_stub(StatusCode::OK, json!({"candidates": []})).await;
        assert_eq!(client(url).generate_prompt("slow page").await.unwrap(), "");
    }

    #[tokio::test]
    async fn blank_review_is_rejected_without_upstream_call() {
        let (url, stub) = spawn_stub(StatusCode::OK, candidate("x")).await;
        let err = client(url).generate_prompt("   ").await.unwrap_err();
        assert!(matches!(err, AiLlmError::Validation(_)));
        assert_eq!(stub.hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn upstream_failure_keeps_status_and_body() {
        let (url, _) = spawn_stub(
            StatusCode::TOO_MANY_REQUESTS,
            json!({"error": {"message": "quota"}}),
        )
        .await;
        let err = client(url).generate_prompt("review").await.unwrap_err();
        match err {
            AiLlmError::Provider(p) => {
                assert_eq!(p.status(), Some(StatusCode::TOO_MANY_REQUESTS));
                assert!(p.body().unwrap().contains("quota"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn code_is_extracted_from_model_output() {
        let text = "```json\n{\"code\":\".btn{font-size:18px}\",\"code_type\":\"css\",\"description\":\"Bigger button\"}\n```";
        let (url, stub) = spawn_stub(StatusCode::OK, candidate(text)).await;
        let artifact = client(url).generate_code("Increase button size").await.unwrap();
        assert_eq!(artifact.code_type, "css");
        assert_eq!(artifact.description, "Bigger button");
        assert_eq!(
            stub.seen.lock().unwrap()[0]["generationConfig"]["maxOutputTokens"],
            2048
        );
    }

    #[tokio::test]
    async fn unparseable_code_output_is_a_parse_error() {
        let (url, _) = spawn_stub(StatusCode::OK, candidate("just prose")).await;
        let err = client(url).generate_code("prompt").await.unwrap_err();
        match err {
            AiLlmError::Parse(p) => assert_eq!(p.raw, "just prose"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct GeneratePromptRequest {
    #[serde(default)]
    pub review: String,
}

#[derive(Debug, Serialize)]
pub struct GeneratePromptResponse {
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateCodeRequest {
    #[serde(default)]
    pub prompt: String,
}

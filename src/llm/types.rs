use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub stream: bool,
}

impl GenerateRequest {
    pub fn text(model: &str, prompt: String) -> Self {
        Self {
            model: model.to_string(),
            prompt,
            format: None,
            stream: false,
        }
    }

    pub fn json(model: &str, prompt: String) -> Self {
        Self {
            format: Some("json".into()),
            ..Self::text(model, prompt)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelTag {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmDiag {
    pub host: String,
    pub model: String,
    pub reachable: bool,
    pub model_available: bool,
    pub models: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

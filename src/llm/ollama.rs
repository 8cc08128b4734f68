use super::{types::*, Completion};
use crate::config::Llm;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Blocking client for a locally hosted Ollama server. One round-trip per call, no retries.
pub struct OllamaClient {
    http: Client,
    host: String,
    model: String,
}

impl OllamaClient {
    pub fn new(cfg: &Llm) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_seconds))
            .build()
            .with_context(|| "building HTTP client")?;
        Ok(Self {
            http,
            host: cfg.host.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    fn list_models(&self) -> Result<Vec<String>> {
        let tags: TagsResponse = self
            .http
            .get(self.url("/api/tags"))
            .send()
            .with_context(|| format!("GET {}/api/tags", self.host))?
            .error_for_status()?
            .json()
            .with_context(|| "parsing /api/tags response")?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

impl Completion for OllamaClient {
    fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse> {
        debug!(
            "llm generate model={} prompt_chars={} format={:?}",
            req.model,
            req.prompt.len(),
            req.format
        );
        let resp = self
            .http
            .post(self.url("/api/generate"))
            .json(req)
            .send()
            .with_context(|| format!("POST {}/api/generate", self.host))?
            .error_for_status()?;
        let out: GenerateResponse = resp
            .json()
            .with_context(|| "parsing /api/generate response")?;
        Ok(out)
    }

    fn doctor(&self) -> Result<LlmDiag> {
        let mut diag = LlmDiag {
            host: self.host.clone(),
            model: self.model.clone(),
            reachable: false,
            model_available: false,
            models: Vec::new(),
            error: None,
        };
        match self.list_models() {
            Ok(models) => {
                diag.reachable = true;
                diag.model_available = models
                    .iter()
                    .any(|m| m == &self.model || m.split(':').next() == Some(self.model.as_str()));
                diag.models = models;
            }
            Err(err) => {
                warn!("llm host unreachable: {err:#}");
                diag.error = Some(format!("{err:#}"));
            }
        }
        Ok(diag)
    }
}

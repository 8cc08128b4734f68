pub mod ollama;
pub mod types;

use anyhow::{anyhow, Result};

pub use ollama::OllamaClient;
pub use types::{GenerateRequest, GenerateResponse, LlmDiag};

/// A blocking prompt-in, text-out completion service.
pub trait Completion {
    fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse>;
    fn doctor(&self) -> Result<LlmDiag>;
}

impl<C: Completion + ?Sized> Completion for &C {
    fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse> {
        (**self).generate(req)
    }

    fn doctor(&self) -> Result<LlmDiag> {
        (**self).doctor()
    }
}

impl<C: Completion + ?Sized> Completion for Box<C> {
    fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse> {
        (**self).generate(req)
    }

    fn doctor(&self) -> Result<LlmDiag> {
        (**self).doctor()
    }
}

/// Stands in for the service when `llm.enabled = false`. Every call fails, so every
/// enrichment step takes its fallback.
#[derive(Debug, Clone, Default)]
pub struct Disabled;

impl Completion for Disabled {
    fn generate(&self, _req: &GenerateRequest) -> Result<GenerateResponse> {
        Err(anyhow!("language model disabled by configuration"))
    }

    fn doctor(&self) -> Result<LlmDiag> {
        Ok(LlmDiag {
            host: String::new(),
            model: String::new(),
            reachable: false,
            model_available: false,
            models: Vec::new(),
            error: Some("disabled".into()),
        })
    }
}

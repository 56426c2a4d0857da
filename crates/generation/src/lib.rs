//! Boundary to the hosted text-generation service.
//!
//! The pipeline only needs "submit a prompt, receive text or a failure".
//! No retries or caching happen here.

use std::sync::Arc;

mod config;
mod error;
mod gemini;
mod scripted;

pub use config::{GeminiConfig, DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL};
pub use error::GenerationError;
pub use gemini::{extract_candidate_text, GeminiClient};
pub use scripted::ScriptedClient;

#[allow(async_fn_in_trait)]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone)]
pub enum Generator {
    Gemini(GeminiClient),
    Scripted(Arc<ScriptedClient>),
}

impl Generator {
    pub fn gemini(config: GeminiConfig) -> Result<Self, GenerationError> {
        Ok(Self::Gemini(GeminiClient::new(config)?))
    }

    pub fn from_env() -> Result<Self, GenerationError> {
        Self::gemini(GeminiConfig::from_env())
    }

    pub fn scripted(client: Arc<ScriptedClient>) -> Self {
        Self::Scripted(client)
    }

    pub fn is_configured(&self) -> bool {
        match self {
            Generator::Gemini(client) => client.config().is_configured(),
            Generator::Scripted(_) => true,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Generator::Gemini(_) => "gemini",
            Generator::Scripted(_) => "scripted",
        }
    }
}

impl GenerationClient for Generator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        match self {
            Generator::Gemini(client) => client.generate(prompt).await,
            Generator::Scripted(client) => client.generate(prompt).await,
        }
    }
}

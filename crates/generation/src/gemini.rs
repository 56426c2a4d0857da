use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::config::GeminiConfig;
use crate::error::GenerationError;
use crate::GenerationClient;

const CONNECT_TIMEOUT_SECONDS: u64 = 6;

/// Text generation over the Gemini `generateContent` REST call.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        let http = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECONDS))
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

impl GenerationClient for GeminiClient {
    #[instrument(skip(self, prompt), fields(model = %self.config.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            GenerationError::NotConfigured("SMARTTRIP_GEMINI_API_KEY is not set".to_string())
        })?;

        let payload = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }
            ]
        });

        let response = self
            .http
            .post(self.config.generate_url())
            .header("x-goog-api-key", api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|error| GenerationError::Decode(error.to_string()))?;
        let text = extract_candidate_text(&body)
            .filter(|value| !value.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        debug!(response_len = text.len(), "gemini text received");
        Ok(text)
    }
}

/// Joins the text parts of the first candidate.
pub fn extract_candidate_text(payload: &Value) -> Option<String> {
    let parts = payload
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let chunks = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>();

    if chunks.is_empty() {
        None
    } else {
        Some(chunks.concat())
    }
}

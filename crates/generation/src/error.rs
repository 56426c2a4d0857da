use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation backend is not configured: {0}")]
    NotConfigured(String),
    #[error("generation request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("generation service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("generation service reply could not be read: {0}")]
    Decode(String),
    #[error("generation service returned no text")]
    EmptyResponse,
    #[error("no scripted generation replies remain")]
    Exhausted,
}

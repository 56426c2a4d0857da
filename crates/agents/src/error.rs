use smarttrip_core::{ResponseError, ValidationError};
use smarttrip_generation::GenerationError;
use thiserror::Error;

/// Everything that can stop a planning request. Each variant is fatal for
/// the request that raised it and is never retried.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Itinerary generation failed: {0}")]
    Transport(#[from] GenerationError),
    #[error("The generated itinerary could not be read: {0}")]
    Parse(serde_json::Error),
    #[error("The generated itinerary was incomplete ({path}: {reason})")]
    Schema { path: String, reason: String },
    #[error("An itinerary is already being generated for this trip")]
    Busy,
    #[error("Option {index} does not exist ({available} available)")]
    OptionOutOfRange { index: usize, available: usize },
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation_error",
            PipelineError::Transport(_) => "transport_error",
            PipelineError::Parse(_) => "parse_error",
            PipelineError::Schema { .. } => "schema_error",
            PipelineError::Busy => "busy",
            PipelineError::OptionOutOfRange { .. } => "option_out_of_range",
        }
    }
}

impl From<ResponseError> for PipelineError {
    fn from(error: ResponseError) -> Self {
        match error {
            ResponseError::Parse(inner) => PipelineError::Parse(inner),
            ResponseError::Schema { path, reason } => PipelineError::Schema { path, reason },
        }
    }
}

use thiserror::Error;

/// Rejections raised while turning a submitted form into a [`crate::TripRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in the following required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("End date must be after start date")]
    EndNotAfterStart,
    #[error("Start date cannot be in the past")]
    StartInPast,
    #[error("Budget must be a positive whole amount")]
    InvalidBudget,
    #[error("Unknown travel group type '{0}' (expected solo, couple, family or friends)")]
    UnknownGroupType(String),
}

/// Failures decoding the text returned by the generation service.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("generated itinerary is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("generated itinerary has an invalid shape at {path}: {reason}")]
    Schema { path: String, reason: String },
}

impl ResponseError {
    pub(crate) fn schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

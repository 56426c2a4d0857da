pub mod error;
pub mod images;
pub mod models;
pub mod parser;
pub mod prompt;
pub mod trip;

pub use error::{ResponseError, ValidationError};
pub use images::{is_valid_image_url, sanitize_image_url, IMAGE_EXTENSIONS};
pub use models::*;
pub use parser::{parse_itinerary_response, strip_fences, ParsedResponse};
pub use prompt::{build_prompt, OPTION_COUNT};
pub use trip::{normalize_interests, trip_duration_days, TripForm, TripRequest};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ResponseError;
use crate::images::sanitize_image_url;
use crate::models::{Coordinates, DayItinerary, Hotel, ItineraryOption, Place};

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

#[derive(Debug, Clone)]
pub struct ParsedResponse {
    pub options: Vec<ItineraryOption>,
    /// Image URLs that failed validation and were replaced with none.
    pub images_dropped: usize,
}

/// Removes a leading "```json" and a trailing "```" when present.
pub fn strip_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix(FENCE_OPEN) {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix(FENCE_CLOSE) {
        body = rest;
    }
    body.trim()
}

/// Decodes generated text into itinerary options.
///
/// Every option must carry `itinerary` and `hotels` arrays; one bad option
/// rejects the whole batch. Invalid image URLs are dropped, not reported as
/// errors. Order is preserved at every level.
pub fn parse_itinerary_response(text: &str) -> Result<ParsedResponse, ResponseError> {
    let value: Value = serde_json::from_str(strip_fences(text))?;

    let options = value
        .get("options")
        .and_then(Value::as_array)
        .ok_or_else(|| ResponseError::schema("options", "missing or not an array"))?;

    let mut images_dropped = 0;
    let mut parsed = Vec::with_capacity(options.len());
    for (index, raw) in options.iter().enumerate() {
        let path = format!("options[{index}]");
        require_array(raw, &path, "itinerary")?;
        require_array(raw, &path, "hotels")?;

        let wire = WireOption::deserialize(raw)
            .map_err(|error| ResponseError::schema(path.clone(), error.to_string()))?;
        let option = wire.into_option(&path, &mut images_dropped)?;

        if !option.has_sequential_days() {
            warn!(option = index, "generated option has non-sequential day numbers");
        }
        parsed.push(option);
    }

    debug!(options = parsed.len(), images_dropped, "generated itinerary decoded");
    Ok(ParsedResponse {
        options: parsed,
        images_dropped,
    })
}

fn require_array(option: &Value, path: &str, field: &str) -> Result<(), ResponseError> {
    match option.get(field) {
        Some(Value::Array(_)) => Ok(()),
        Some(_) => Err(ResponseError::schema(
            format!("{path}.{field}"),
            "not an array",
        )),
        None => Err(ResponseError::schema(format!("{path}.{field}"), "missing")),
    }
}

/// Text fields the model sometimes emits as bare numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LooseText {
    Text(String),
    Number(serde_json::Number),
}

impl LooseText {
    fn into_string(self) -> String {
        match self {
            Self::Text(value) => value,
            Self::Number(value) => value.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireCoordinates {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePlace {
    name: String,
    description: String,
    coordinates: WireCoordinates,
    #[serde(default)]
    ticket_price: Option<LooseText>,
    #[serde(default)]
    best_time: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireHotel {
    name: String,
    address: String,
    price: LooseText,
    rating: LooseText,
    coordinates: WireCoordinates,
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireDay {
    day: u32,
    places: Vec<WirePlace>,
}

#[derive(Debug, Deserialize)]
struct WireOption {
    title: String,
    description: String,
    itinerary: Vec<WireDay>,
    hotels: Vec<WireHotel>,
}

impl WireOption {
    fn into_option(
        self,
        path: &str,
        images_dropped: &mut usize,
    ) -> Result<ItineraryOption, ResponseError> {
        let mut itinerary = Vec::with_capacity(self.itinerary.len());
        for (day_index, day) in self.itinerary.into_iter().enumerate() {
            let mut places = Vec::with_capacity(day.places.len());
            for (place_index, place) in day.places.into_iter().enumerate() {
                let place_path = format!("{path}.itinerary[{day_index}].places[{place_index}]");
                let coordinates = checked_coordinates(place.coordinates, &place_path)?;
                places.push(Place {
                    name: place.name,
                    description: place.description,
                    coordinates,
                    ticket_price: place.ticket_price.map(LooseText::into_string),
                    best_time: place.best_time,
                    image_url: keep_image(place.image_url, images_dropped),
                });
            }
            itinerary.push(DayItinerary {
                day: day.day,
                places,
            });
        }

        let mut hotels = Vec::with_capacity(self.hotels.len());
        for (hotel_index, hotel) in self.hotels.into_iter().enumerate() {
            let hotel_path = format!("{path}.hotels[{hotel_index}]");
            let coordinates = checked_coordinates(hotel.coordinates, &hotel_path)?;
            let rating = checked_rating(hotel.rating.into_string(), &hotel_path)?;
            hotels.push(Hotel {
                name: hotel.name,
                address: hotel.address,
                price: hotel.price.into_string(),
                rating,
                coordinates,
                image_url: keep_image(hotel.image_url, images_dropped),
            });
        }

        Ok(ItineraryOption {
            title: self.title,
            description: self.description,
            itinerary,
            hotels,
        })
    }
}

fn checked_coordinates(raw: WireCoordinates, path: &str) -> Result<Coordinates, ResponseError> {
    let coordinates = Coordinates::new(raw.lat, raw.lng);
    if coordinates.is_valid() {
        Ok(coordinates)
    } else {
        Err(ResponseError::schema(
            format!("{path}.coordinates"),
            format!("({}, {}) is outside latitude/longitude range", raw.lat, raw.lng),
        ))
    }
}

fn checked_rating(rating: String, path: &str) -> Result<String, ResponseError> {
    let trimmed = rating.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if (0.0..=5.0).contains(&value) => Ok(trimmed.to_string()),
        Ok(value) => Err(ResponseError::schema(
            format!("{path}.rating"),
            format!("{value} is outside 0-5"),
        )),
        Err(_) => Err(ResponseError::schema(
            format!("{path}.rating"),
            format!("'{trimmed}' is not numeric"),
        )),
    }
}

fn keep_image(candidate: Option<String>, images_dropped: &mut usize) -> Option<String> {
    let present = candidate.is_some();
    let kept = sanitize_image_url(candidate);
    if present && kept.is_none() {
        *images_dropped += 1;
    }
    kept
}

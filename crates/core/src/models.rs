use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupType {
    Solo,
    Couple,
    Family,
    Friends,
}

impl GroupType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "solo" => Some(Self::Solo),
            "couple" => Some(Self::Couple),
            "family" => Some(Self::Family),
            "friends" => Some(Self::Friends),
            _ => None,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Solo => "solo",
            Self::Couple => "couple",
            Self::Family => "family",
            Self::Friends => "friends",
        }
    }
}

impl std::fmt::Display for GroupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and inside the WGS84 latitude/longitude ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub name: String,
    pub description: String,
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    pub name: String,
    pub address: String,
    pub price: String,
    /// Numeric text between 0 and 5, kept as the service wrote it.
    pub rating: String,
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayItinerary {
    pub day: u32,
    pub places: Vec<Place>,
}

impl DayItinerary {
    /// Ordered stops for the day, as drawn on the route map.
    pub fn route(&self) -> Vec<Coordinates> {
        self.places.iter().map(|place| place.coordinates).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryOption {
    pub title: String,
    pub description: String,
    pub itinerary: Vec<DayItinerary>,
    pub hotels: Vec<Hotel>,
}

impl ItineraryOption {
    pub fn has_sequential_days(&self) -> bool {
        self.itinerary
            .iter()
            .enumerate()
            .all(|(index, day)| day.day as usize == index + 1)
    }

    /// Mean position of every place and hotel in the option.
    pub fn map_center(&self) -> Option<Coordinates> {
        let points = self
            .itinerary
            .iter()
            .flat_map(|day| day.places.iter().map(|place| place.coordinates))
            .chain(self.hotels.iter().map(|hotel| hotel.coordinates))
            .collect::<Vec<_>>();

        if points.is_empty() {
            return None;
        }

        let count = points.len() as f64;
        let (lat, lng) = points
            .iter()
            .fold((0.0, 0.0), |(lat, lng), point| (lat + point.lat, lng + point.lng));
        Some(Coordinates::new(lat / count, lng / count))
    }

    pub fn place_count(&self) -> usize {
        self.itinerary.iter().map(|day| day.places.len()).sum()
    }
}

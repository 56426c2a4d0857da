use crate::trip::TripRequest;

/// Number of independent alternatives requested per generation.
pub const OPTION_COUNT: usize = 3;

const RESPONSE_EXAMPLE: &str = r#"{
  "options": [
    {
      "title": "Option title",
      "description": "One or two sentences on what makes this plan different",
      "itinerary": [
        {
          "day": 1,
          "places": [
            {
              "name": "Place name",
              "description": "What to do there",
              "coordinates": { "lat": 0.0, "lng": 0.0 },
              "ticketPrice": "Free",
              "bestTime": "Morning",
              "imageUrl": "https://example.com/photo.jpg"
            }
          ]
        }
      ],
      "hotels": [
        {
          "name": "Hotel name",
          "address": "Street, city",
          "price": "$120 per night",
          "rating": "4.5",
          "coordinates": { "lat": 0.0, "lng": 0.0 },
          "imageUrl": "https://example.com/hotel.jpg"
        }
      ]
    }
  ]
}"#;

/// Renders the generation prompt for a validated trip.
pub fn build_prompt(request: &TripRequest) -> String {
    let days = request.duration_days();
    let unit = if days == 1 { "day" } else { "days" };

    format!(
        "You are an expert travel planner. Create {count} distinct itinerary options for the trip below.\n\
         \n\
         Destination: {destination}\n\
         Duration: {days} {unit}\n\
         Group type: {group}\n\
         Budget: {budget}\n\
         Interests: {interests}\n\
         \n\
         Rules:\n\
         - Each option is an independent alternative, not a variation of another option.\n\
         - Cover every day from 1 to {days} in order, with places listed in visiting order.\n\
         - Recommend hotels that fit the budget for this group type.\n\
         - Coordinates are decimal latitude and longitude.\n\
         - imageUrl must be a direct http(s) link to a .jpg, .jpeg, .png, .webp, .avif, .gif or .svg file; omit it otherwise.\n\
         - Respond with JSON only, shaped exactly like this example:\n\
         \n\
         {example}\n",
        count = OPTION_COUNT,
        destination = request.destination(),
        days = days,
        unit = unit,
        group = request.group_type(),
        budget = request.budget(),
        interests = request.interests().join(", "),
        example = RESPONSE_EXAMPLE,
    )
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::trip::TripForm;

    fn request(start: (i32, u32, u32), end: (i32, u32, u32)) -> TripRequest {
        TripForm {
            destination: "Mumbai".to_string(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2),
            interests: vec!["history".to_string(), "nightlife".to_string()],
            budget: 2600,
            group_type: "solo".to_string(),
        }
        .validate(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
        .unwrap()
    }

    #[test]
    fn prompt_states_trip_parameters() {
        let prompt = build_prompt(&request((2025, 6, 29), (2025, 7, 3)));
        assert!(prompt.contains("Destination: Mumbai"));
        assert!(prompt.contains("Duration: 5 days"));
        assert!(prompt.contains("Group type: solo"));
        assert!(prompt.contains("Budget: 2600"));
        assert!(prompt.contains("Interests: history, nightlife"));
    }

    #[test]
    fn prompt_embeds_parseable_example() {
        let prompt = build_prompt(&request((2025, 6, 29), (2025, 6, 30)));
        let start = prompt.find('{').unwrap();
        let end = prompt.rfind('}').unwrap();
        let example: serde_json::Value = serde_json::from_str(&prompt[start..=end]).unwrap();
        let option = &example["options"][0];
        assert!(option["itinerary"][0]["places"][0]["coordinates"]["lat"].is_number());
        assert!(option["hotels"][0]["rating"].is_string());
    }
}

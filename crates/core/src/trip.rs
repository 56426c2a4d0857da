use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::GroupType;

pub const DEFAULT_BUDGET: i64 = 1000;

/// Trip preferences as submitted, before any checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripForm {
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default = "default_budget")]
    pub budget: i64,
    #[serde(default = "default_group_type")]
    pub group_type: String,
}

impl Default for TripForm {
    fn default() -> Self {
        Self {
            destination: String::new(),
            start_date: None,
            end_date: None,
            interests: Vec::new(),
            budget: DEFAULT_BUDGET,
            group_type: default_group_type(),
        }
    }
}

fn default_budget() -> i64 {
    DEFAULT_BUDGET
}

fn default_group_type() -> String {
    GroupType::Solo.as_code().to_string()
}

impl TripForm {
    /// Checks the form against `today` and produces a request the pipeline can consume.
    pub fn validate(&self, today: NaiveDate) -> Result<TripRequest, ValidationError> {
        let destination = self.destination.trim();
        let interests = normalize_interests(&self.interests);
        let group_code = self.group_type.trim();

        let mut missing = Vec::new();
        if destination.is_empty() {
            missing.push("Destination");
        }
        if self.start_date.is_none() {
            missing.push("Start Date");
        }
        if self.end_date.is_none() {
            missing.push("End Date");
        }
        if interests.is_empty() {
            missing.push("Interests");
        }
        if group_code.is_empty() {
            missing.push("Travel Group Type");
        }

        let (Some(start_date), Some(end_date)) = (self.start_date, self.end_date) else {
            return Err(ValidationError::MissingFields(missing));
        };
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        let group_type = GroupType::parse(group_code)
            .ok_or_else(|| ValidationError::UnknownGroupType(group_code.to_string()))?;

        let budget = u32::try_from(self.budget)
            .ok()
            .filter(|value| *value > 0)
            .ok_or(ValidationError::InvalidBudget)?;

        if start_date >= end_date {
            return Err(ValidationError::EndNotAfterStart);
        }
        if start_date < today {
            return Err(ValidationError::StartInPast);
        }

        Ok(TripRequest {
            destination: destination.to_string(),
            start_date,
            end_date,
            interests,
            budget,
            group_type,
        })
    }
}

/// Validated trip parameters. Only [`TripForm::validate`] builds one, so the
/// end date is always after the start date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRequest {
    destination: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    interests: Vec<String>,
    budget: u32,
    group_type: GroupType,
}

impl TripRequest {
    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn interests(&self) -> &[String] {
        &self.interests
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn group_type(&self) -> GroupType {
        self.group_type
    }

    pub fn duration_days(&self) -> u32 {
        inclusive_days(self.start_date, self.end_date)
    }
}

/// Inclusive number of calendar days covered by `start..=end`.
pub fn trip_duration_days(start: NaiveDate, end: NaiveDate) -> Result<u32, ValidationError> {
    if end < start {
        return Err(ValidationError::EndNotAfterStart);
    }
    Ok(inclusive_days(start, end))
}

fn inclusive_days(start: NaiveDate, end: NaiveDate) -> u32 {
    let span = (end - start).num_days().max(0);
    u32::try_from(span).unwrap_or(u32::MAX - 1) + 1
}

/// Trimmed, lower-cased, first occurrence wins.
pub fn normalize_interests(raw: &[String]) -> Vec<String> {
    let mut seen = Vec::<String>::new();
    for tag in raw {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}

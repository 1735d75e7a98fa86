use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Day keys for the weekly menu, in display order.
pub const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Validates and canonicalizes a weekday path segment.
pub fn parse_weekday(s: &str) -> Option<&'static str> {
    let lower = s.to_ascii_lowercase();
    WEEKDAYS.iter().find(|d| **d == lower).copied()
}

/// Breakfast and snacks entries carry an image alongside the item name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageItem {
    pub name: String,
    pub image_url: Option<String>,
}

/// One day's mess menu. Keyed by weekday — exactly seven rows exist.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MenuDay {
    pub id: Uuid,
    pub weekday: String,
    pub breakfast: Json<Vec<ImageItem>>,
    pub snacks: Json<Vec<ImageItem>>,
    pub lunch: Vec<String>,
    pub dinner: Vec<String>,
    pub special_lunch: Vec<String>,
    pub special_dinner: Vec<String>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// Body for PUT /menu/{weekday}. Omitted sections are stored empty.
#[derive(Debug, Deserialize)]
pub struct UpsertMenuDayRequest {
    #[serde(default)]
    pub breakfast: Vec<ImageItem>,
    #[serde(default)]
    pub snacks: Vec<ImageItem>,
    #[serde(default)]
    pub lunch: Vec<String>,
    #[serde(default)]
    pub dinner: Vec<String>,
    #[serde(default)]
    pub special_lunch: Vec<String>,
    #[serde(default)]
    pub special_dinner: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_parsing_is_case_insensitive_and_closed() {
        assert_eq!(parse_weekday("Monday"), Some("monday"));
        assert_eq!(parse_weekday("SUNDAY"), Some("sunday"));
        assert_eq!(parse_weekday("funday"), None);
    }
}

pub mod admin;
pub mod attendance;
pub mod auth;
pub mod health;
pub mod media;
pub mod menu;

use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

use crate::mealtime::MealType;

/// Shared path-segment parser for /attendance/{meal} style routes.
pub(crate) fn parse_meal(raw: &str) -> Result<MealType, (StatusCode, Json<Value>)> {
    raw.parse().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "message": format!("Unknown meal type: {raw}") })),
        )
    })
}

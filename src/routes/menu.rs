use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    models::{
        auth::AuthenticatedUser,
        menu::{parse_weekday, UpsertMenuDayRequest},
        user::UserRole,
    },
    services::menu::MenuService,
    AppState,
};

fn weekday_or_400(raw: &str) -> Result<&'static str, (StatusCode, Json<Value>)> {
    parse_weekday(raw).ok_or((
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "message": format!("Unknown weekday: {raw}") })),
    ))
}

/// GET /menu — the whole week, any authenticated user.
pub async fn get_week(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    MenuService::list_week(&state.db)
        .await
        .map(|days| Json(json!({ "success": true, "menu": days })))
        .map_err(|e| {
            tracing::error!("menu query failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": "Something went wrong, please try again" })),
            )
        })
}

/// GET /menu/{weekday}
pub async fn get_day(
    State(state): State<AppState>,
    Path(weekday): Path<String>,
    _user: AuthenticatedUser,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let weekday = weekday_or_400(&weekday)?;

    match MenuService::get_day(&state.db, weekday).await {
        Ok(Some(day)) => Ok(Json(json!({ "success": true, "menu": day }))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": format!("No menu recorded for {weekday}") })),
        )),
        Err(e) => {
            tracing::error!("menu query failed: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": "Something went wrong, please try again" })),
            ))
        }
    }
}

/// PUT /menu/{weekday} — admins only.
pub async fn upsert_day(
    State(state): State<AppState>,
    Path(weekday): Path<String>,
    user: AuthenticatedUser,
    Json(body): Json<UpsertMenuDayRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if user.role != UserRole::Admin {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "success": false, "message": "Admin access required" })),
        ));
    }
    let weekday = weekday_or_400(&weekday)?;

    MenuService::upsert_day(&state.db, weekday, &body, user.user_id)
        .await
        .map(|day| Json(json!({ "success": true, "menu": day })))
        .map_err(|e| {
            tracing::error!("menu upsert failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": "Something went wrong, please try again" })),
            )
        })
}

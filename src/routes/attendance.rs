use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    mealtime::Clock,
    models::{
        attendance::{AttendanceDateQuery, SubmitAttendanceRequest, INDIVIDUAL_DEFAULT_STATUS},
        auth::AuthenticatedUser,
    },
    routes::parse_meal,
    services::attendance::{AttendanceService, SubmitError, SubmitOutcome},
    AppState,
};

/// POST /attendance/{meal} — record the caller's yes/no for a date.
pub async fn submit(
    State(state): State<AppState>,
    Path(meal): Path<String>,
    user: AuthenticatedUser,
    Json(body): Json<SubmitAttendanceRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let meal = parse_meal(&meal)?;

    match AttendanceService::submit(
        &state.db,
        &state.schedule,
        state.clock.as_ref(),
        state.config.write_semantics,
        user.user_id,
        meal,
        &body,
    )
    .await
    {
        Ok((SubmitOutcome::Created, date)) => Ok((
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": format!("{meal} attendance recorded for {date}")
            })),
        )),
        Ok((SubmitOutcome::Updated, date)) => Ok((
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": format!("{meal} attendance updated for {date}")
            })),
        )),
        Err(e @ SubmitError::Closed(_)) => Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "success": false, "message": e.to_string() })),
        )),
        Err(e @ SubmitError::Duplicate { .. }) => Err((
            StatusCode::CONFLICT,
            Json(json!({ "success": false, "message": e.to_string() })),
        )),
        Err(e @ SubmitError::NegativeGuestCount) => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "message": e.to_string() })),
        )),
        Err(SubmitError::Db(e)) => {
            tracing::error!("attendance write failed: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": "Something went wrong, please try again" })),
            ))
        }
    }
}

/// GET /attendance/{meal}?date=YYYY-MM-DD — the caller's own record, or
/// the "no response" sentinel when nothing was submitted. Defaults to the
/// date a submission made now would apply to.
pub async fn my_record(
    State(state): State<AppState>,
    Path(meal): Path<String>,
    user: AuthenticatedUser,
    Query(params): Query<AttendanceDateQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let meal = parse_meal(&meal)?;
    let date = params
        .date
        .unwrap_or_else(|| state.schedule.resolve_target_date(meal, state.clock.now()));

    match AttendanceService::find_own(&state.db, user.user_id, meal, date).await {
        Ok(Some(record)) => Ok(Json(json!({
            "date": record.date,
            "status": record.status,
            "count": record.guest_count,
        }))),
        Ok(None) => Ok(Json(json!({
            "date": date,
            "status": INDIVIDUAL_DEFAULT_STATUS,
        }))),
        Err(e) => {
            tracing::error!("attendance lookup failed: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": "Something went wrong, please try again" })),
            ))
        }
    }
}

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    models::{
        attendance::AttendanceDateQuery,
        auth::AuthenticatedUser,
        user::{SetMembershipRequest, UserRole},
    },
    routes::parse_meal,
    services::{
        report::{ReportError, ReportService},
        roster::RosterService,
    },
    AppState,
};

fn require_admin(user: &AuthenticatedUser) -> Result<(), (StatusCode, Json<Value>)> {
    match user.role {
        UserRole::Admin => Ok(()),
        _ => Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "success": false, "message": "Admin access required" })),
        )),
    }
}

/// GET /admin/reports/{meal}?date=YYYY-MM-DD — the aggregate attendance
/// report. Gated until the morning visibility time; the gate response
/// carries the server's local time so the portal can show when to retry.
pub async fn meal_report(
    State(state): State<AppState>,
    Path(meal): Path<String>,
    user: AuthenticatedUser,
    Query(params): Query<AttendanceDateQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_admin(&user)?;
    let meal = parse_meal(&meal)?;

    match ReportService::build_report(
        &state.db,
        &state.schedule,
        state.clock.as_ref(),
        meal,
        params.date,
    )
    .await
    {
        Ok(report) => Ok(Json(json!({ "success": true, "report": report }))),
        Err(e @ ReportError::NotYetVisible { .. }) => {
            let current_server_time = match &e {
                ReportError::NotYetVisible { now, .. } => now.to_rfc3339(),
                _ => String::new(),
            };
            Err((
                StatusCode::FORBIDDEN,
                Json(json!({
                    "success": false,
                    "message": e.to_string(),
                    "current_server_time": current_server_time,
                })),
            ))
        }
        Err(ReportError::Db(e)) => {
            tracing::error!("report query failed: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": "Something went wrong, please try again" })),
            ))
        }
    }
}

/// GET /admin/members
pub async fn list_members(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_admin(&user)?;

    RosterService::list(&state.db)
        .await
        .map(|members| Json(json!({ "success": true, "members": members })))
        .map_err(|e| {
            tracing::error!("member list failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": "Something went wrong, please try again" })),
            )
        })
}

/// PUT /admin/members/{id}/membership — toggle Active/Inactive.
pub async fn set_membership(
    State(state): State<AppState>,
    Path(member_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(body): Json<SetMembershipRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_admin(&user)?;

    match RosterService::set_membership(&state.db, member_id, body.is_active).await {
        Ok(true) => Ok(Json(json!({ "success": true }))),
        Ok(false) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "Member not found" })),
        )),
        Err(e) => {
            tracing::error!("membership update failed: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": "Something went wrong, please try again" })),
            ))
        }
    }
}

/// POST /admin/members/import — CSV upload (`name,email[,role]`).
pub async fn import_roster(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_admin(&user)?;

    let mut data: Option<Vec<u8>> = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "message": e.to_string() })),
        )
    })? {
        if field.name().unwrap_or("") == "file" {
            let bytes = field.bytes().await.map_err(|e| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "success": false, "message": e.to_string() })),
                )
            })?;
            data = Some(bytes.to_vec());
        }
    }

    let data = data.ok_or((
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "message": "No file field in upload" })),
    ))?;

    RosterService::import_csv(&state.db, state.email.as_deref(), &data)
        .await
        .map(|summary| Json(json!({ "success": true, "summary": summary })))
        .map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "message": e.to_string() })),
            )
        })
}

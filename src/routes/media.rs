use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde_json::{json, Value};

use crate::{
    models::{auth::AuthenticatedUser, user::UserRole},
    services::media::MediaService,
    AppState,
};

/// POST /media — upload a menu image (admins only).
pub async fn upload_media(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    if user.role != UserRole::Admin {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "success": false, "message": "Admin access required" })),
        ));
    }

    MediaService::upload(&state.db, user.user_id, &state.config.media_dir, multipart)
        .await
        .map(|media| {
            let url = format!("/media/files/{}", media.storage_path);
            (
                StatusCode::CREATED,
                Json(json!({ "success": true, "media": media, "url": url })),
            )
        })
        .map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "message": e.to_string() })),
            )
        })
}

/// GET /media/files/{*path} — serve a stored image.
pub async fn serve_media(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let (content_type, bytes) = MediaService::read_file(&state.config.media_dir, &path)
        .await
        .map_err(|e| {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "success": false, "message": e.to_string() })),
            )
        })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(bytes))
        .map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": "Something went wrong, please try again" })),
            )
        })
}

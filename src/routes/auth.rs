use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{
    middleware::rate_limit::{check_rate_limit, email_rate_key},
    models::{
        auth::AuthenticatedUser,
        user::{
            LoginRequest, OtpRequest, OtpVerifyRequest, PasskeyLoginRequest, RegisterRequest,
        },
    },
    services::auth::AuthService,
    AppState,
};

/// POST /auth/register — guest self-registration.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    if body.name.trim().is_empty() || !body.email.contains('@') || body.password.len() < 8 {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "message": "Name, a valid email and a password of at least 8 characters are required"
            })),
        ));
    }

    AuthService::register(&state.db, body.name.trim(), &body.email.to_lowercase(), &body.password)
        .await
        .map(|profile| {
            (
                StatusCode::CREATED,
                Json(json!({ "success": true, "user": profile })),
            )
        })
        .map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "message": e.to_string() })),
            )
        })
}

/// POST /auth/login — password login.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    // Rate limit: 5 attempts per 15 min per email
    let rate_key = email_rate_key("login", &body.email);
    let mut redis = state.redis.clone();
    check_rate_limit(&mut redis, &rate_key, 5, 900).await?;

    AuthService::login(
        &state.db,
        &body.email.to_lowercase(),
        &body.password,
        &state.config.jwt_secret,
        state.config.jwt_expiry_seconds,
    )
    .await
    .map(|res| Json(serde_json::to_value(res).unwrap()))
    .map_err(|e| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": e.to_string() })),
        )
    })
}

/// POST /auth/otp/request — email a one-time login code.
pub async fn request_otp(
    State(state): State<AppState>,
    Json(body): Json<OtpRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    // Rate limit: 3 codes per 10 min per email
    let rate_key = email_rate_key("otp", &body.email);
    let mut redis = state.redis.clone();
    check_rate_limit(&mut redis, &rate_key, 3, 600).await?;

    AuthService::request_otp(&state.db, state.email.as_deref(), &body.email.to_lowercase())
        .await
        .map(|_| {
            Json(json!({
                "success": true,
                "message": "If the account exists, a login code has been sent"
            }))
        })
        .map_err(|e| {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "success": false, "message": e.to_string() })),
            )
        })
}

/// POST /auth/otp/verify — exchange the emailed code for a token.
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<OtpVerifyRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    // Rate limit: 10 attempts per 15 min per email
    let rate_key = email_rate_key("otp-verify", &body.email);
    let mut redis = state.redis.clone();
    check_rate_limit(&mut redis, &rate_key, 10, 900).await?;

    AuthService::verify_otp(
        &state.db,
        &body.email.to_lowercase(),
        &body.code,
        &state.config.jwt_secret,
        state.config.jwt_expiry_seconds,
    )
    .await
    .map(|res| Json(serde_json::to_value(res).unwrap()))
    .map_err(|e| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": e.to_string() })),
        )
    })
}

/// POST /auth/passkey — admin login with the shared daily passkey.
pub async fn passkey_login(
    State(state): State<AppState>,
    Json(body): Json<PasskeyLoginRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    // Rate limit: 5 attempts per 15 min per email
    let rate_key = email_rate_key("passkey", &body.email);
    let mut redis = state.redis.clone();
    check_rate_limit(&mut redis, &rate_key, 5, 900).await?;

    AuthService::passkey_login(
        &state.db,
        &state.schedule,
        state.clock.as_ref(),
        &state.config.passkey_secret,
        &body.email.to_lowercase(),
        &body.passkey,
        &state.config.jwt_secret,
        state.config.jwt_expiry_seconds,
    )
    .await
    .map(|res| Json(serde_json::to_value(res).unwrap()))
    .map_err(|e| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": e.to_string() })),
        )
    })
}

/// POST /auth/passkey/request — mail today's passkey to an admin address.
/// Responds generically so the route cannot be used to probe for admins.
pub async fn request_passkey(
    State(state): State<AppState>,
    Json(body): Json<OtpRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    // Rate limit: 3 requests per 10 min per email
    let rate_key = email_rate_key("passkey-mail", &body.email);
    let mut redis = state.redis.clone();
    check_rate_limit(&mut redis, &rate_key, 3, 600).await?;

    AuthService::send_daily_passkey(
        &state.db,
        state.email.as_deref(),
        &state.schedule,
        state.clock.as_ref(),
        &state.config.passkey_secret,
        &body.email.to_lowercase(),
    )
    .await
    .map(|_| {
        Json(json!({
            "success": true,
            "message": "If the address belongs to an admin, the passkey has been sent"
        }))
    })
    .map_err(|e| {
        tracing::error!("passkey mail failed: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": "Something went wrong, please try again" })),
        )
    })
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    AuthService::get_profile(&state.db, user.user_id)
        .await
        .map(|profile| Json(serde_json::to_value(profile).unwrap()))
        .map_err(|e| {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "success": false, "message": e.to_string() })),
            )
        })
}

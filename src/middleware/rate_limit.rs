use axum::{http::StatusCode, Json};
use serde_json::json;

/// Key for the per-address limits on the auth endpoints.
pub fn email_rate_key(scope: &str, email: &str) -> String {
    format!("rate:{scope}:{}", email.to_lowercase())
}

/// Sliding-window counter in Redis, INCR + EXPIRE: the first increment
/// arms the TTL, later ones only count, and the caller gets a 429 once
/// the window's attempts are used up. A Redis hiccup fails open.
pub async fn check_rate_limit(
    redis: &mut redis::aio::MultiplexedConnection,
    key: &str,
    max_attempts: u64,
    window_secs: u64,
) -> Result<(), (StatusCode, Json<serde_json::Value>)> {
    let count: u64 = redis::cmd("INCR")
        .arg(key)
        .query_async(redis)
        .await
        .unwrap_or(0);

    if count == 1 {
        let _: Result<(), _> = redis::cmd("EXPIRE")
            .arg(key)
            .arg(window_secs)
            .query_async(redis)
            .await;
    }

    if count > max_attempts {
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "success": false, "message": "Too many attempts. Try again in a few minutes." })),
        ));
    }

    Ok(())
}

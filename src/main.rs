use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use messdesk_api::config::Config;
use messdesk_api::mealtime::SystemClock;
use messdesk_api::middleware::auth::JwtSecret;
use messdesk_api::services::email::EmailService;
use messdesk_api::{db, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);
    let schedule = Arc::new(config.meal_schedule()?);

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let redis_client = redis::Client::open(config.redis_url.as_str())?;
    let redis_conn = redis_client.get_multiplexed_async_connection().await?;
    info!("Redis connected");

    let email = EmailService::new(&config).map(Arc::new);
    if email.is_some() {
        info!("SMTP email service configured");
    } else {
        info!("SMTP not configured — OTP login and passkey mail disabled");
    }

    let state = AppState {
        db: pool,
        redis: redis_conn,
        config: config.clone(),
        schedule,
        clock: Arc::new(SystemClock),
        email,
    };

    // CORS: the configured portal origin, plus localhost for development.
    let base_url = config.app_base_url.clone();
    let cors_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let o = match origin.to_str() {
            Ok(s) => s,
            Err(_) => return false,
        };
        if o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1") {
            return true;
        }
        o == base_url
    });

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_origin(cors_origin);

    let jwt_secret = JwtSecret(config.jwt_secret.clone());

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        // Auth
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/otp/request", post(routes::auth::request_otp))
        .route("/auth/otp/verify", post(routes::auth::verify_otp))
        .route("/auth/passkey", post(routes::auth::passkey_login))
        .route("/auth/passkey/request", post(routes::auth::request_passkey))
        .route("/auth/me", get(routes::auth::me))
        // Attendance
        .route(
            "/attendance/{meal}",
            get(routes::attendance::my_record).post(routes::attendance::submit),
        )
        // Admin
        .route("/admin/reports/{meal}", get(routes::admin::meal_report))
        .route("/admin/members", get(routes::admin::list_members))
        .route("/admin/members/import", post(routes::admin::import_roster))
        .route(
            "/admin/members/{id}/membership",
            put(routes::admin::set_membership),
        )
        // Menu
        .route("/menu", get(routes::menu::get_week))
        .route(
            "/menu/{weekday}",
            get(routes::menu::get_day).put(routes::menu::upsert_day),
        )
        // Media
        .route("/media", post(routes::media::upload_media))
        .route("/media/files/{*path}", get(routes::media::serve_media))
        .layer(axum::Extension(jwt_secret))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Global body size limit of 10 MB (covers menu image uploads)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("messdesk API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub mod config;
pub mod db;
pub mod mealtime;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use sqlx::PgPool;

use config::Config;
use mealtime::{Clock, MealSchedule};
use services::email::EmailService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: redis::aio::MultiplexedConnection,
    pub config: Arc<Config>,
    pub schedule: Arc<MealSchedule>,
    pub clock: Arc<dyn Clock>,
    pub email: Option<Arc<EmailService>>,
}

use std::env;

use chrono::{FixedOffset, NaiveTime};

use crate::mealtime::MealSchedule;
use crate::models::attendance::WriteSemantics;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub jwt_expiry_seconds: u64,
    pub passkey_secret: String,
    pub media_dir: String,
    pub host: String,
    pub port: u16,
    pub app_base_url: String,
    /// Institute-local offset from UTC, in minutes (default +330, UTC+05:30).
    pub tz_offset_minutes: i32,
    pub lunch_cutoff: NaiveTime,
    pub dinner_cutoff: NaiveTime,
    pub report_visible_from: NaiveTime,
    pub write_semantics: WriteSemantics,
    // SMTP (optional)
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiry_seconds: env::var("JWT_EXPIRY_SECONDS")
                .unwrap_or_else(|_| "86400".into())
                .parse()?,
            passkey_secret: required("PASSKEY_SECRET")?,
            media_dir: env::var("MEDIA_DIR").unwrap_or_else(|_| "/data/media".into()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost".into()),
            tz_offset_minutes: env::var("TZ_OFFSET_MINUTES")
                .unwrap_or_else(|_| "330".into())
                .parse()?,
            lunch_cutoff: parse_time("LUNCH_CUTOFF", "09:00")?,
            dinner_cutoff: parse_time("DINNER_CUTOFF", "16:30")?,
            report_visible_from: parse_time("REPORT_VISIBLE_FROM", "07:00")?,
            write_semantics: env::var("ATTENDANCE_WRITE_MODE")
                .unwrap_or_else(|_| "upsert".into())
                .parse()?,
            smtp_host: env::var("SMTP_HOST").ok().filter(|s| !s.is_empty()),
            smtp_port: env::var("SMTP_PORT").ok().and_then(|v| v.parse().ok()),
            smtp_username: env::var("SMTP_USERNAME").ok().filter(|s| !s.is_empty()),
            smtp_password: env::var("SMTP_PASSWORD").ok().filter(|s| !s.is_empty()),
            smtp_from: env::var("SMTP_FROM").ok().filter(|s| !s.is_empty()),
        })
    }

    /// The wall-clock rule set every cutoff decision flows through.
    pub fn meal_schedule(&self) -> anyhow::Result<MealSchedule> {
        let tz = FixedOffset::east_opt(self.tz_offset_minutes * 60)
            .ok_or_else(|| anyhow::anyhow!("TZ_OFFSET_MINUTES out of range: {}", self.tz_offset_minutes))?;
        Ok(MealSchedule::new(
            tz,
            self.lunch_cutoff,
            self.dinner_cutoff,
            self.report_visible_from,
        ))
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}

fn parse_time(key: &str, default: &str) -> anyhow::Result<NaiveTime> {
    let raw = env::var(key).unwrap_or_else(|_| default.into());
    NaiveTime::parse_from_str(&raw, "%H:%M")
        .map_err(|e| anyhow::anyhow!("Invalid {key} ({raw}): {e}"))
}

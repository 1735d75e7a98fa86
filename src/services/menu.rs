use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::menu::{MenuDay, UpsertMenuDayRequest, WEEKDAYS};

const MENU_COLS: &str = "id, weekday, breakfast, snacks, lunch, dinner, special_lunch, special_dinner, updated_by, updated_at";

pub struct MenuService;

impl MenuService {
    /// All stored menu days in weekday display order. Days never written
    /// are simply absent.
    pub async fn list_week(pool: &PgPool) -> anyhow::Result<Vec<MenuDay>> {
        let mut days = sqlx::query_as::<_, MenuDay>(&format!(
            "SELECT {MENU_COLS} FROM menu_days"
        ))
        .fetch_all(pool)
        .await?;
        days.sort_by_key(|d| {
            WEEKDAYS
                .iter()
                .position(|w| *w == d.weekday)
                .unwrap_or(WEEKDAYS.len())
        });
        Ok(days)
    }

    pub async fn get_day(pool: &PgPool, weekday: &str) -> anyhow::Result<Option<MenuDay>> {
        let day = sqlx::query_as::<_, MenuDay>(&format!(
            "SELECT {MENU_COLS} FROM menu_days WHERE weekday = $1"
        ))
        .bind(weekday)
        .fetch_optional(pool)
        .await?;
        Ok(day)
    }

    /// Insert or replace the menu for one weekday.
    pub async fn upsert_day(
        pool: &PgPool,
        weekday: &str,
        req: &UpsertMenuDayRequest,
        updated_by: Uuid,
    ) -> anyhow::Result<MenuDay> {
        let day = sqlx::query_as::<_, MenuDay>(&format!(
            "INSERT INTO menu_days
                 (weekday, breakfast, snacks, lunch, dinner, special_lunch, special_dinner, updated_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (weekday) DO UPDATE SET
                 breakfast = EXCLUDED.breakfast,
                 snacks = EXCLUDED.snacks,
                 lunch = EXCLUDED.lunch,
                 dinner = EXCLUDED.dinner,
                 special_lunch = EXCLUDED.special_lunch,
                 special_dinner = EXCLUDED.special_dinner,
                 updated_by = EXCLUDED.updated_by,
                 updated_at = NOW()
             RETURNING {MENU_COLS}"
        ))
        .bind(weekday)
        .bind(Json(req.breakfast.clone()))
        .bind(Json(req.snacks.clone()))
        .bind(&req.lunch)
        .bind(&req.dinner)
        .bind(&req.special_lunch)
        .bind(&req.special_dinner)
        .bind(updated_by)
        .fetch_one(pool)
        .await?;
        Ok(day)
    }
}

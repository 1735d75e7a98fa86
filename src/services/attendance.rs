use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::mealtime::{Clock, CutoffRejection, MealSchedule, MealType};
use crate::models::attendance::{
    AttendanceRecord, MealStatus, SubmitAttendanceRequest, WriteSemantics,
};

/// Everything a submission can come back with besides success. Policy
/// rejections are normal negative-path results; only `Db` is a server
/// error.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("{0}")]
    Closed(#[from] CutoffRejection),
    #[error("attendance already submitted for {date}")]
    Duplicate { date: NaiveDate },
    #[error("guest count must be a non-negative integer")]
    NegativeGuestCount,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created,
    Updated,
}

/// A "no" never brings guests; the caller-supplied count only applies to
/// a "yes".
pub fn effective_guest_count(status: MealStatus, count: Option<i32>) -> i32 {
    match status {
        MealStatus::No => 0,
        MealStatus::Yes => count.unwrap_or(0),
    }
}

pub struct AttendanceService;

impl AttendanceService {
    /// Record the caller's choice for one meal on one date. Applies the
    /// cutoff policy before touching the store; exactly one write happens
    /// on the success path.
    pub async fn submit(
        pool: &PgPool,
        schedule: &MealSchedule,
        clock: &dyn Clock,
        semantics: WriteSemantics,
        user_id: Uuid,
        meal: MealType,
        req: &SubmitAttendanceRequest,
    ) -> Result<(SubmitOutcome, NaiveDate), SubmitError> {
        if req.count.is_some_and(|c| c < 0) {
            return Err(SubmitError::NegativeGuestCount);
        }

        let now = clock.now();
        let target = req
            .date
            .unwrap_or_else(|| schedule.resolve_target_date(meal, now));
        schedule.can_submit(meal, now, target)?;

        let guest_count = effective_guest_count(req.status, req.count);
        let meal_key = meal.to_string();
        let status_key = req.status.to_string();

        let existing: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM attendance_records
             WHERE user_id = $1 AND date = $2 AND meal_type = $3",
        )
        .bind(user_id)
        .bind(target)
        .bind(&meal_key)
        .fetch_optional(pool)
        .await?;

        match semantics {
            WriteSemantics::CreateOnce => {
                if existing.is_some() {
                    return Err(SubmitError::Duplicate { date: target });
                }
                let result = sqlx::query(
                    "INSERT INTO attendance_records (user_id, date, meal_type, status, guest_count)
                     VALUES ($1, $2, $3, $4, $5)
                     ON CONFLICT (user_id, date, meal_type) DO NOTHING",
                )
                .bind(user_id)
                .bind(target)
                .bind(&meal_key)
                .bind(&status_key)
                .bind(guest_count)
                .execute(pool)
                .await?;

                // The unique index decides races: a concurrent winner makes
                // this a no-op, which callers must see as the same
                // duplicate rejection as the pre-check.
                if result.rows_affected() == 0 {
                    return Err(SubmitError::Duplicate { date: target });
                }
                Ok((SubmitOutcome::Created, target))
            }
            WriteSemantics::Upsert => {
                sqlx::query(
                    "INSERT INTO attendance_records (user_id, date, meal_type, status, guest_count)
                     VALUES ($1, $2, $3, $4, $5)
                     ON CONFLICT (user_id, date, meal_type) DO UPDATE SET
                         status = EXCLUDED.status,
                         guest_count = EXCLUDED.guest_count,
                         updated_at = NOW()",
                )
                .bind(user_id)
                .bind(target)
                .bind(&meal_key)
                .bind(&status_key)
                .bind(guest_count)
                .execute(pool)
                .await?;

                let outcome = if existing.is_some() {
                    SubmitOutcome::Updated
                } else {
                    SubmitOutcome::Created
                };
                Ok((outcome, target))
            }
        }
    }

    /// The caller's own record for a date, if any. The HTTP layer turns
    /// `None` into the "no response" sentinel.
    pub async fn find_own(
        pool: &PgPool,
        user_id: Uuid,
        meal: MealType,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, user_id, date, meal_type, status, guest_count, created_at, updated_at
             FROM attendance_records
             WHERE user_id = $1 AND date = $2 AND meal_type = $3",
        )
        .bind(user_id)
        .bind(date)
        .bind(meal.to_string())
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_forces_guest_count_to_zero() {
        assert_eq!(effective_guest_count(MealStatus::No, Some(5)), 0);
        assert_eq!(effective_guest_count(MealStatus::No, None), 0);
    }

    #[test]
    fn yes_keeps_supplied_guest_count() {
        assert_eq!(effective_guest_count(MealStatus::Yes, Some(3)), 3);
        assert_eq!(effective_guest_count(MealStatus::Yes, None), 0);
    }
}

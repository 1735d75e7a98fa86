use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::mealtime::{Clock, MealSchedule, MealType};
use crate::models::attendance::{AttendanceRecord, ReportRow, ROSTER_DEFAULT_STATUS};

/// Roster entry as the report sees it: active members only.
#[derive(Debug, Clone, FromRow)]
pub struct RosterMember {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("report is not available before {} local time", .visible_from.format("%-I:%M %p"))]
    NotYetVisible {
        visible_from: NaiveTime,
        now: DateTime<FixedOffset>,
    },
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

pub struct ReportService;

impl ReportService {
    /// One line per active roster member for (meal, date). Gated until the
    /// schedule's visibility time; an empty roster is a valid zero-entry
    /// report, distinct from the gate.
    pub async fn build_report(
        pool: &PgPool,
        schedule: &MealSchedule,
        clock: &dyn Clock,
        meal: MealType,
        date: Option<NaiveDate>,
    ) -> Result<Vec<ReportRow>, ReportError> {
        let now = clock.now();
        if !schedule.is_report_visible(now) {
            return Err(ReportError::NotYetVisible {
                visible_from: schedule.report_visible_from(),
                now: schedule.local(now),
            });
        }

        let date = date.unwrap_or_else(|| schedule.local_date(now));

        // Name-ascending keeps rank assignment deterministic across runs;
        // email breaks ties between namesakes.
        let roster: Vec<RosterMember> = sqlx::query_as(
            "SELECT id, name, email, photo_url FROM users
             WHERE is_active = TRUE
             ORDER BY name, email",
        )
        .fetch_all(pool)
        .await?;

        let records: Vec<AttendanceRecord> = sqlx::query_as(
            "SELECT id, user_id, date, meal_type, status, guest_count, created_at, updated_at
             FROM attendance_records
             WHERE date = $1 AND meal_type = $2",
        )
        .bind(date)
        .bind(meal.to_string())
        .fetch_all(pool)
        .await?;

        Ok(assemble_report(&roster, &records))
    }
}

/// Join the roster against the day's records. Members without a record
/// get the roster default ("Yes" — the opt-out rule); stored statuses are
/// normalized case-insensitively.
pub fn assemble_report(roster: &[RosterMember], records: &[AttendanceRecord]) -> Vec<ReportRow> {
    let by_user: HashMap<Uuid, &AttendanceRecord> =
        records.iter().map(|r| (r.user_id, r)).collect();

    roster
        .iter()
        .enumerate()
        .map(|(i, member)| ReportRow {
            rank: i + 1,
            name: member.name.clone(),
            email: member.email.clone(),
            photo_url: member.photo_url.clone(),
            status: by_user
                .get(&member.id)
                .map(|r| normalize_status(&r.status))
                .unwrap_or_else(|| ROSTER_DEFAULT_STATUS.to_string()),
        })
        .collect()
}

fn normalize_status(raw: &str) -> String {
    if raw.eq_ignore_ascii_case("no") {
        "No".to_string()
    } else {
        "Yes".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn member(id: Uuid, name: &str, email: &str) -> RosterMember {
        RosterMember {
            id,
            name: name.to_string(),
            email: email.to_string(),
            photo_url: None,
        }
    }

    fn record(user_id: Uuid, status: &str) -> AttendanceRecord {
        AttendanceRecord {
            id: Uuid::new_v4(),
            user_id,
            date: "2025-07-25".parse().unwrap(),
            meal_type: "lunch".to_string(),
            status: status.to_string(),
            guest_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn silent_members_default_to_yes() {
        let roster = vec![
            member(Uuid::new_v4(), "Asha", "a@x"),
            member(Uuid::new_v4(), "Bela", "b@x"),
            member(Uuid::new_v4(), "Chitra", "c@x"),
        ];
        let report = assemble_report(&roster, &[]);
        assert_eq!(report.len(), 3);
        assert!(report.iter().all(|row| row.status == "Yes"));
    }

    #[test]
    fn recorded_no_overrides_the_default() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let roster = vec![member(a, "Asha", "a@x"), member(b, "Bela", "b@x")];
        let records = vec![record(a, "no")];

        let report = assemble_report(&roster, &records);
        assert_eq!(report[0].email, "a@x");
        assert_eq!(report[0].status, "No");
        assert_eq!(report[1].email, "b@x");
        assert_eq!(report[1].status, "Yes");
    }

    #[test]
    fn stored_statuses_normalize_case_insensitively() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let roster = vec![member(a, "Asha", "a@x"), member(b, "Bela", "b@x")];
        let records = vec![record(a, "NO"), record(b, "Yes")];

        let report = assemble_report(&roster, &records);
        assert_eq!(report[0].status, "No");
        assert_eq!(report[1].status, "Yes");
    }

    #[test]
    fn rank_is_one_based_in_roster_order() {
        let roster = vec![
            member(Uuid::new_v4(), "Asha", "a@x"),
            member(Uuid::new_v4(), "Bela", "b@x"),
        ];
        let report = assemble_report(&roster, &[]);
        assert_eq!(report[0].rank, 1);
        assert_eq!(report[1].rank, 2);
    }

    #[test]
    fn empty_roster_is_a_valid_empty_report() {
        let report = assemble_report(&[], &[record(Uuid::new_v4(), "yes")]);
        assert!(report.is_empty());
    }
}

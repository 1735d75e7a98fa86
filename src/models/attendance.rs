use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Status an individual `GET` returns when the caller has no record for
/// the requested date. Deliberately different from [`ROSTER_DEFAULT_STATUS`]:
/// an individual lookup reports silence as silence.
pub const INDIVIDUAL_DEFAULT_STATUS: &str = "no response";

/// Status the aggregate report assigns to an active member with no record
/// for the date. The mess runs an opt-out model: members who never respond
/// are counted as attending.
pub const ROSTER_DEFAULT_STATUS: &str = "Yes";

/// A stored attendance choice. "no response" is never written — it is a
/// derived sentinel, not a settable status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealStatus {
    Yes,
    No,
}

impl std::fmt::Display for MealStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MealStatus::Yes => "yes",
            MealStatus::No => "no",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for MealStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yes" => Ok(MealStatus::Yes),
            "no" => Ok(MealStatus::No),
            _ => Err(anyhow::anyhow!("Unknown attendance status: {s}")),
        }
    }
}

/// Which write semantic the submission service enforces. Both appear in
/// the wild for different user classes; a deployment picks exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteSemantics {
    /// Resubmission before the cutoff overwrites the stored choice.
    Upsert,
    /// The first submission for a date is final; later ones are refused.
    CreateOnce,
}

impl std::str::FromStr for WriteSemantics {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upsert" => Ok(WriteSemantics::Upsert),
            "create_once" => Ok(WriteSemantics::CreateOnce),
            _ => Err(anyhow::anyhow!("Unknown attendance write mode: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub meal_type: String,
    pub status: String,
    pub guest_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for POST /attendance/{meal}. When `date` is omitted the server
/// resolves the target date from the current instant.
#[derive(Debug, Deserialize)]
pub struct SubmitAttendanceRequest {
    pub date: Option<NaiveDate>,
    pub status: MealStatus,
    pub count: Option<i32>,
}

/// Query params for GET /attendance/{meal} and the admin report.
#[derive(Debug, Deserialize)]
pub struct AttendanceDateQuery {
    pub date: Option<NaiveDate>,
}

/// One line of the aggregate report: every active roster member appears
/// exactly once, defaulted when they never responded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub rank: usize,
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
    pub status: String,
}

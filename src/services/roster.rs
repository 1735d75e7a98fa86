use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::{User, UserProfile, UserRole};
use crate::services::email::EmailService;

const USER_COLS: &str =
    "id, name, email, password_hash, role, photo_url, is_active, created_at, updated_at";

#[derive(Debug, Deserialize)]
struct CsvRow {
    name: String,
    email: String,
    #[serde(default)]
    role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterImportRow {
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub skipped: usize,
}

/// Parse a `name,email[,role]` CSV into validated roster rows. Fails on
/// the first malformed row rather than importing half a file.
pub fn parse_roster_csv(data: &[u8]) -> anyhow::Result<Vec<RosterImportRow>> {
    let mut reader = csv::Reader::from_reader(data);
    let mut rows = Vec::new();

    for (i, result) in reader.deserialize::<CsvRow>().enumerate() {
        let line = i + 2; // header is line 1
        let row = result.map_err(|e| anyhow::anyhow!("CSV line {line}: {e}"))?;

        let name = row.name.trim().to_string();
        let email = row.email.trim().to_lowercase();
        if name.is_empty() {
            anyhow::bail!("CSV line {line}: name is required");
        }
        if !email.contains('@') {
            anyhow::bail!("CSV line {line}: invalid email {email:?}");
        }

        let role = match row.role.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("CSV line {line}: unknown role {raw:?}"))?,
            None => UserRole::Member,
        };

        rows.push(RosterImportRow { name, email, role });
    }

    Ok(rows)
}

pub struct RosterService;

impl RosterService {
    /// Full member list for the admin portal, admins first.
    pub async fn list(pool: &PgPool) -> anyhow::Result<Vec<UserProfile>> {
        let users: Vec<User> = sqlx::query_as(&format!(
            "SELECT {USER_COLS} FROM users ORDER BY role, name, email"
        ))
        .fetch_all(pool)
        .await?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    /// Flip a member's Active/Inactive state. Returns false when no such
    /// user exists. Inactive members keep their history but leave the
    /// report roster.
    pub async fn set_membership(
        pool: &PgPool,
        user_id: Uuid,
        is_active: bool,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET is_active = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(is_active)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Bulk-create members from a CSV upload. Existing emails are left
    /// untouched and counted as skipped; new members get a temporary
    /// password, mailed when SMTP is configured.
    pub async fn import_csv(
        pool: &PgPool,
        email_svc: Option<&EmailService>,
        data: &[u8],
    ) -> anyhow::Result<ImportSummary> {
        let rows = parse_roster_csv(data)?;
        let mut summary = ImportSummary::default();

        for row in rows {
            use rand::Rng;
            let temp_password: String = rand::thread_rng()
                .sample_iter(&rand::distributions::Alphanumeric)
                .take(12)
                .map(char::from)
                .collect();
            let password_hash = bcrypt::hash(&temp_password, 12)?;

            let result = sqlx::query(
                "INSERT INTO users (name, email, password_hash, role)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (email) DO NOTHING",
            )
            .bind(&row.name)
            .bind(&row.email)
            .bind(&password_hash)
            .bind(row.role.to_string())
            .execute(pool)
            .await?;

            if result.rows_affected() == 0 {
                summary.skipped += 1;
                continue;
            }
            summary.created += 1;

            if let Some(svc) = email_svc {
                // Ignore send errors — the account exists either way
                let _ = svc
                    .send_import_welcome(&row.email, &row.name, &temp_password)
                    .await;
            }
        }

        tracing::info!(
            created = summary.created,
            skipped = summary.skipped,
            "roster import finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_defaults_role_to_member() {
        let data = b"name,email\nAsha Rao,asha@inst.edu\nBela Sen,BELA@inst.edu\n";
        let rows = parse_roster_csv(data).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].role, UserRole::Member);
        // Emails are lowered for the unique key
        assert_eq!(rows[1].email, "bela@inst.edu");
    }

    #[test]
    fn honours_an_explicit_role_column() {
        let data = b"name,email,role\nAsha Rao,asha@inst.edu,admin\n";
        let rows = parse_roster_csv(data).unwrap();
        assert_eq!(rows[0].role, UserRole::Admin);
    }

    #[test]
    fn rejects_bad_rows_with_line_numbers() {
        let err = parse_roster_csv(b"name,email\nAsha,not-an-email\n").unwrap_err();
        assert!(err.to_string().contains("line 2"), "got: {err}");

        let err = parse_roster_csv(b"name,email,role\nAsha,a@x,chef\n").unwrap_err();
        assert!(err.to_string().contains("chef"), "got: {err}");
    }
}

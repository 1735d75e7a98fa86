use chrono::{NaiveDate, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::mealtime::{Clock, MealSchedule};
use crate::models::{
    auth::Claims,
    user::{LoginResponse, User, UserProfile, UserRole},
};
use crate::services::email::EmailService;

const USER_COLS: &str =
    "id, name, email, password_hash, role, photo_url, is_active, created_at, updated_at";

/// The shared admin passkey for a local calendar date. Deterministic, so
/// every admin sees the same code for the day and it rotates at local
/// midnight.
pub fn derive_daily_passkey(secret: &str, date: NaiveDate) -> String {
    let digest = Sha256::digest(format!("{secret}:{date}").as_bytes());
    hex::encode(&digest[..4]).to_uppercase()
}

pub struct AuthService;

impl AuthService {
    async fn find_active_user(pool: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLS} FROM users WHERE email = $1 AND is_active = TRUE"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    /// Guest self-registration: name + email + password.
    pub async fn register(
        pool: &PgPool,
        name: &str,
        email: &str,
        password: &str,
    ) -> anyhow::Result<UserProfile> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(pool)
                .await?;
        if exists {
            anyhow::bail!("This email is already registered");
        }

        let password_hash = bcrypt::hash(password, 12)?;

        let user: User = sqlx::query_as(&format!(
            "INSERT INTO users (name, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLS}"
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(UserRole::Guest.to_string())
        .fetch_one(pool)
        .await?;

        Ok(user.into())
    }

    /// Password login for any role.
    pub async fn login(
        pool: &PgPool,
        email: &str,
        password: &str,
        jwt_secret: &str,
        ttl_seconds: u64,
    ) -> anyhow::Result<LoginResponse> {
        let user = Self::find_active_user(pool, email)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Invalid credentials"))?;

        let valid = bcrypt::verify(password, &user.password_hash)
            .map_err(|_| anyhow::anyhow!("Invalid credentials"))?;
        if !valid {
            anyhow::bail!("Invalid credentials");
        }

        let access_token = Self::generate_access_token(&user, jwt_secret, ttl_seconds)?;
        Ok(LoginResponse {
            access_token,
            user: user.into(),
        })
    }

    /// Step 1 of OTP login: generate a 6-digit code, invalidate previous
    /// unused codes, and email it. Always returns Ok for unknown emails to
    /// avoid leaking account existence.
    pub async fn request_otp(
        pool: &PgPool,
        email_svc: Option<&EmailService>,
        email: &str,
    ) -> anyhow::Result<()> {
        let email_svc = email_svc
            .ok_or_else(|| anyhow::anyhow!("Email service not configured (SMTP required for OTP login)"))?;

        let Some(user) = Self::find_active_user(pool, email).await? else {
            return Ok(());
        };

        sqlx::query("UPDATE otp_codes SET used = TRUE WHERE user_id = $1 AND used = FALSE")
            .bind(user.id)
            .execute(pool)
            .await?;

        use rand::Rng;
        let code: u32 = rand::thread_rng().gen_range(100000..=999999);
        let code_str = format!("{code}");
        let expires_at = Utc::now() + chrono::Duration::minutes(15);

        sqlx::query("INSERT INTO otp_codes (user_id, code, expires_at) VALUES ($1, $2, $3)")
            .bind(user.id)
            .bind(&code_str)
            .bind(expires_at)
            .execute(pool)
            .await?;

        email_svc
            .send_otp_code(email, &user.name, &code_str)
            .await
            .map_err(|e| anyhow::anyhow!("Could not send the login code: {e}"))?;

        Ok(())
    }

    /// Step 2 of OTP login: verify the code and issue the JWT. Attempts
    /// are capped at 3 per code.
    pub async fn verify_otp(
        pool: &PgPool,
        email: &str,
        code: &str,
        jwt_secret: &str,
        ttl_seconds: u64,
    ) -> anyhow::Result<LoginResponse> {
        let user = Self::find_active_user(pool, email)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Invalid credentials"))?;

        let row: Option<(Uuid, String, i16)> = sqlx::query_as(
            "SELECT id, code, attempts FROM otp_codes
             WHERE user_id = $1 AND used = FALSE AND expires_at > NOW()
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user.id)
        .fetch_optional(pool)
        .await?;

        let (code_id, stored_code, attempts) =
            row.ok_or_else(|| anyhow::anyhow!("Code invalid or expired. Request a new one."))?;

        if attempts >= 3 {
            anyhow::bail!("Too many attempts. Request a new code.");
        }

        sqlx::query("UPDATE otp_codes SET attempts = attempts + 1 WHERE id = $1")
            .bind(code_id)
            .execute(pool)
            .await?;

        if code != stored_code {
            anyhow::bail!("Invalid code");
        }

        sqlx::query("UPDATE otp_codes SET used = TRUE WHERE id = $1")
            .bind(code_id)
            .execute(pool)
            .await?;

        let access_token = Self::generate_access_token(&user, jwt_secret, ttl_seconds)?;
        Ok(LoginResponse {
            access_token,
            user: user.into(),
        })
    }

    /// Admin login with the shared daily passkey.
    pub async fn passkey_login(
        pool: &PgPool,
        schedule: &MealSchedule,
        clock: &dyn Clock,
        passkey_secret: &str,
        email: &str,
        passkey: &str,
        jwt_secret: &str,
        ttl_seconds: u64,
    ) -> anyhow::Result<LoginResponse> {
        let user = Self::find_active_user(pool, email)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Invalid credentials"))?;

        let role: UserRole = user.role.parse().unwrap_or(UserRole::Guest);
        if role != UserRole::Admin {
            anyhow::bail!("Invalid credentials");
        }

        let today = schedule.local_date(clock.now());
        let expected = derive_daily_passkey(passkey_secret, today);
        if !passkey.eq_ignore_ascii_case(&expected) {
            anyhow::bail!("Invalid passkey");
        }

        let access_token = Self::generate_access_token(&user, jwt_secret, ttl_seconds)?;
        Ok(LoginResponse {
            access_token,
            user: user.into(),
        })
    }

    /// Email today's passkey to a registered admin address. Always returns
    /// Ok to avoid leaking which addresses belong to admins.
    pub async fn send_daily_passkey(
        pool: &PgPool,
        email_svc: Option<&EmailService>,
        schedule: &MealSchedule,
        clock: &dyn Clock,
        passkey_secret: &str,
        email: &str,
    ) -> anyhow::Result<()> {
        if let Some(user) = Self::find_active_user(pool, email).await? {
            let role: UserRole = user.role.parse().unwrap_or(UserRole::Guest);
            if role == UserRole::Admin {
                if let Some(svc) = email_svc {
                    let today = schedule.local_date(clock.now());
                    let passkey = derive_daily_passkey(passkey_secret, today);
                    // Ignore send errors — the caller gets a generic response either way
                    let _ = svc.send_daily_passkey(email, &user.name, &passkey, today).await;
                }
            }
        }
        Ok(())
    }

    pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> anyhow::Result<UserProfile> {
        let user: User = sqlx::query_as(&format!("SELECT {USER_COLS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found"))?;
        Ok(user.into())
    }

    pub fn generate_access_token(
        user: &User,
        secret: &str,
        ttl_seconds: u64,
    ) -> anyhow::Result<String> {
        let role: UserRole = user.role.parse().unwrap_or(UserRole::Guest);
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user.id.to_string(),
            role,
            iat: now,
            exp: now + ttl_seconds as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_passkey_is_deterministic_per_date() {
        let d: NaiveDate = "2025-07-25".parse().unwrap();
        let a = derive_daily_passkey("secret", d);
        let b = derive_daily_passkey("secret", d);
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn daily_passkey_rotates_with_date_and_secret() {
        let d1: NaiveDate = "2025-07-25".parse().unwrap();
        let d2: NaiveDate = "2025-07-26".parse().unwrap();
        assert_ne!(derive_daily_passkey("secret", d1), derive_daily_passkey("secret", d2));
        assert_ne!(derive_daily_passkey("secret", d1), derive_daily_passkey("other", d1));
    }
}

//! Demo seed script
//!
//! Seeds a local database with a small mess community:
//! - 1 admin, 3 active members, 1 guest (all under @demo.mess)
//! - a full seven-day menu
//! - a few attendance records for today's lunch and dinner
//!
//! Usage:
//!   DATABASE_URL=... ./seed-demo [--password Demo2024!] [--fresh]

use anyhow::{Context, Result};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use messdesk_api::mealtime::{Clock, MealSchedule, SystemClock};
use messdesk_api::models::menu::{ImageItem, WEEKDAYS};

#[derive(Parser)]
#[command(name = "seed-demo", about = "Seed a demo mess roster, menu and attendance data")]
struct Args {
    /// Password for all demo accounts
    #[arg(long, default_value = "Demo2024!")]
    password: String,

    /// Delete previously seeded demo rows first
    #[arg(long)]
    fresh: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL required")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    messdesk_api::db::run_migrations(&pool).await?;

    if args.fresh {
        println!("Cleaning previously seeded demo data...");
        sqlx::query("DELETE FROM users WHERE email LIKE '%@demo.mess'")
            .execute(&pool)
            .await?;
        sqlx::query("DELETE FROM menu_days").execute(&pool).await?;
    }

    println!("=== Seed demo mess ===");

    let password_hash = bcrypt::hash(&args.password, 12)?;

    let people: [(&str, &str, &str); 5] = [
        ("Meera Pillai", "admin@demo.mess", "admin"),
        ("Asha Rao", "asha@demo.mess", "member"),
        ("Bela Sen", "bela@demo.mess", "member"),
        ("Chitra Iyer", "chitra@demo.mess", "member"),
        ("Dev Khanna", "guest@demo.mess", "guest"),
    ];

    let mut ids: Vec<Uuid> = Vec::new();
    for (name, email, role) in people {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO users (name, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name
             RETURNING id",
        )
        .bind(name)
        .bind(email)
        .bind(&password_hash)
        .bind(role)
        .fetch_one(&pool)
        .await?;
        ids.push(id);
        println!("  user {email} ({role})");
    }

    seed_menu(&pool).await?;

    // Attendance for today: one yes-with-guest, one no, the rest silent.
    let schedule = MealSchedule::default();
    let today = schedule.local_date(SystemClock.now());

    let records = [
        (ids[1], "lunch", "yes", 1),
        (ids[2], "lunch", "no", 0),
        (ids[1], "dinner", "no", 0),
        (ids[3], "dinner", "yes", 0),
    ];
    for (user_id, meal, status, guests) in records {
        sqlx::query(
            "INSERT INTO attendance_records (user_id, date, meal_type, status, guest_count)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id, date, meal_type) DO NOTHING",
        )
        .bind(user_id)
        .bind(today)
        .bind(meal)
        .bind(status)
        .bind(guests)
        .execute(&pool)
        .await?;
    }
    println!("  attendance records for {today}");

    println!("Done. All demo accounts use password {:?}.", args.password);
    Ok(())
}

async fn seed_menu(pool: &PgPool) -> Result<()> {
    let breakfast = |name: &str| {
        Json(vec![
            ImageItem {
                name: name.to_string(),
                image_url: None,
            },
            ImageItem {
                name: "Tea / Coffee".to_string(),
                image_url: None,
            },
        ])
    };
    let snacks = Json(vec![ImageItem {
        name: "Samosa".to_string(),
        image_url: None,
    }]);

    let breakfasts = [
        "Poha", "Idli & Sambar", "Upma", "Paratha", "Dosa", "Chole Bhature", "Puri Bhaji",
    ];

    for (i, weekday) in WEEKDAYS.iter().enumerate() {
        let lunch: Vec<String> = vec!["Dal".into(), "Rice".into(), "Seasonal Sabzi".into()];
        let dinner: Vec<String> = vec!["Roti".into(), "Paneer Curry".into(), "Salad".into()];
        let special_lunch: Vec<String> = if *weekday == "sunday" {
            vec!["Gulab Jamun".into()]
        } else {
            vec![]
        };
        let special_dinner: Vec<String> = if *weekday == "friday" {
            vec!["Ice Cream".into()]
        } else {
            vec![]
        };

        sqlx::query(
            "INSERT INTO menu_days
                 (weekday, breakfast, snacks, lunch, dinner, special_lunch, special_dinner)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (weekday) DO UPDATE SET
                 breakfast = EXCLUDED.breakfast,
                 snacks = EXCLUDED.snacks,
                 lunch = EXCLUDED.lunch,
                 dinner = EXCLUDED.dinner,
                 special_lunch = EXCLUDED.special_lunch,
                 special_dinner = EXCLUDED.special_dinner,
                 updated_at = NOW()",
        )
        .bind(weekday)
        .bind(breakfast(breakfasts[i]))
        .bind(&snacks)
        .bind(&lunch)
        .bind(&dinner)
        .bind(&special_lunch)
        .bind(&special_dinner)
        .execute(pool)
        .await?;
    }
    println!("  menu for all seven days");
    Ok(())
}

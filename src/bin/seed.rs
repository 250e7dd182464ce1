use anyhow::{Context, bail};
use portfolio_api::{
    PostgresRepository,
    config::AppConfig,
    seed::{AdminSeed, DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD, seed_admin, seed_content},
};
use sqlx::postgres::PgPoolOptions;

const USAGE: &str = "usage: seed <admin|content>";

/// seed
///
/// Populates a fresh database: `seed admin` creates the admin account from `ADMIN_EMAIL` /
/// `ADMIN_PASSWORD`, `seed content` upserts the sample bio and projects.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "portfolio_api=info,seed=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let command = std::env::args().nth(1).unwrap_or_default();
    if command != "admin" && command != "content" {
        bail!(USAGE);
    }

    let config = AppConfig::load().context("invalid configuration")?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.db_url)
        .await
        .context("failed to connect to Postgres, check DATABASE_URL")?;
    sqlx::migrate!()
        .run(&pool)
        .await
        .context("failed to run migrations")?;
    let repo = PostgresRepository::new(pool);

    if command == "admin" {
        let email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.to_string());
        let password =
            std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string());
        match seed_admin(&repo, &email, &password).await? {
            AdminSeed::Created => {
                tracing::info!(email = %email, "admin user created");
                if password == DEFAULT_ADMIN_PASSWORD {
                    tracing::warn!("default admin password in use, change it after first login");
                }
            }
            AdminSeed::AlreadyExists => tracing::info!(email = %email, "admin user already exists"),
        }
    } else {
        let report = seed_content(&repo).await?;
        tracing::info!(
            inserted = report.inserted.len(),
            skipped = report.skipped.len(),
            "seeding complete"
        );
    }

    Ok(())
}

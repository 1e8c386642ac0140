//! lms-import - bulk load books or students from a CSV file
//!
//! Usage: `lms-import <books|students> <file.csv>`

use std::sync::Arc;

use anyhow::{bail, Context};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lms_core::{
    clock::SystemClock,
    config::{AppConfig, LoggingConfig},
    models::Actor,
    repository::Repository,
    services::Services,
};

const USAGE: &str = "usage: lms-import <books|students> <file.csv>";

enum Target {
    Books,
    Students,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    let mut args = std::env::args().skip(1);
    let target = match args.next().as_deref() {
        Some("books") => Target::Books,
        Some("students") => Target::Students,
        _ => bail!(USAGE),
    };
    let path = args.next().context(USAGE)?;
    let data = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Cannot read {}", path))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    let repository = Arc::new(Repository::new(pool));
    repository.migrate().await?;
    tracing::info!("Database migrations completed");

    let services = Services::new(repository, Arc::new(SystemClock), &config.circulation);
    let report = match target {
        Target::Books => services.import.import_books(&Actor::Admin, data.as_slice()).await?,
        Target::Students => services.import.import_students(&Actor::Admin, data.as_slice()).await?,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("lms_core={0},lms_import={0}", logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

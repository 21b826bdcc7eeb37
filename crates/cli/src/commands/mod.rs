//! CLI subcommands.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `TRACKING_*`, `DEFAULT_RESTAURANT_CODE` - see `TrackingConfig`

pub mod customer;
pub mod history;
pub mod migrate;
pub mod reservation;

use secrecy::SecretString;
use thiserror::Error;

use casanova_tracking::{ConfigError, CustomerTracking, PgStore, TrackingConfig, TrackingError};
use casanova_tracking::store::postgres;

/// Errors shared by the subcommands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Tracking(#[from] TrackingError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Connect to the database named by `DATABASE_URL`.
async fn connect() -> Result<PgStore, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = postgres::create_pool(&database_url).await?;
    Ok(PgStore::new(pool))
}

/// Connect and wrap the store in the tracking facade.
async fn tracking() -> Result<CustomerTracking<PgStore>, CommandError> {
    let store = connect().await?;
    let config = TrackingConfig::from_env()?;
    Ok(CustomerTracking::new(store, config))
}

/// Write one JSON document per line to stdout.
#[allow(clippy::print_stdout)]
fn print_json(value: &impl serde::Serialize) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

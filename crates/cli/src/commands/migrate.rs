//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! casanova-cli migrate
//! ```
//!
//! Migrations live in `crates/tracking/migrations/` and are embedded into the
//! binary, so the command works from any directory.

use super::{CommandError, connect};

/// Apply pending migrations to the `casanova` schema.
///
/// # Errors
///
/// Returns `CommandError` if the connection or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let store = connect().await?;

    tracing::info!("Running migrations...");
    store.migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}

//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! cosmetics-cli migrate
//! ```
//!
//! Migrations live in `crates/api/migrations/` and are embedded into the
//! binary at build time. The API server never runs them on startup.

use cosmetics_api::db::MIGRATOR;

use super::{CommandError, connect};

/// Apply all pending migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running catalog migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Catalog migrations complete!");
    Ok(())
}

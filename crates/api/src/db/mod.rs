//! Database operations for the catalog `PostgreSQL` database.
//!
//! # Schema: `catalog`
//!
//! ## Tables
//!
//! - `account` - Login identity; owns every other row
//! - `auth_token` - SHA-256 digests of issued bearer tokens
//! - `brand`, `store` - Named, account-owned lookup entities
//! - `product_group` - Top-level grouping (seeded at account creation)
//! - `category` - Sub-grouping, unique per (name, group)
//! - `product` - Catalog items
//! - `product_store` - Product/store many-to-many links
//!
//! Every repository method takes the owning [`AccountId`] explicitly; there is
//! no query in this module that can read or write another account's rows.
//! Foreign keys have no `ON DELETE` behavior, so each `delete` removes or
//! detaches dependent rows itself inside one transaction.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p cosmetics-cli -- migrate
//! ```
//!
//! [`AccountId`]: cosmetics_core::AccountId

pub mod accounts;
pub mod brands;
pub mod categories;
pub mod groups;
pub mod products;
pub mod stores;
pub mod tokens;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use accounts::{AccountCreatedHook, AccountRepository};
pub use brands::BrandRepository;
pub use categories::CategoryRepository;
pub use groups::GroupRepository;
pub use products::{CategoryFallback, ProductRepository};
pub use stores::StoreRepository;
pub use tokens::TokenRepository;

/// Embedded SQL migrations for the catalog schema.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A field of the input names something that cannot be used.
    #[error("invalid {field}: {message}")]
    Invalid {
        /// Payload field the problem belongs to.
        field: &'static str,
        /// Human-readable description.
        message: String,
    },
}

impl RepositoryError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Map a unique-constraint violation on `constraint` to `on_violation`,
/// leaving every other error as a database error.
pub(crate) fn map_unique_violation(
    err: sqlx::Error,
    constraint: &str,
    on_violation: impl FnOnce() -> RepositoryError,
) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
        && db_err.constraint() == Some(constraint)
    {
        return on_violation();
    }
    RepositoryError::Database(err)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Pagination window applied to a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Maximum number of rows to return.
    pub limit: i64,
    /// Number of rows to skip.
    pub offset: i64,
}

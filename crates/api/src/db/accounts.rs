//! Account repository for database operations.
//!
//! Account creation accepts an [`AccountCreatedHook`] that runs inside the
//! creating transaction, so whatever the hook writes commits or rolls back
//! together with the account row.

use std::future::Future;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use cosmetics_core::{AccountId, Email};

use super::{RepositoryError, map_unique_violation};
use crate::models::account::{Account, NewAccount};

/// Work performed in the same transaction that inserts a new account.
///
/// Invoked exactly once per account, right after its row is inserted and
/// before commit. Returning an error aborts the account creation.
pub trait AccountCreatedHook: Sync {
    /// React to a freshly inserted account.
    fn on_account_created(
        &self,
        conn: &mut PgConnection,
        account: &Account,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

// =============================================================================
// Internal Row Types
// =============================================================================

const ACCOUNT_COLUMNS: &str =
    "id, email, username, is_active, is_staff, is_superuser, created_at, updated_at";

/// Internal row type for `PostgreSQL` account queries.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: i32,
    email: String,
    username: String,
    is_active: bool,
    is_staff: bool,
    is_superuser: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: AccountId::new(row.id),
            email,
            username: row.username,
            is_active: row.is_active,
            is_staff: row.is_staff,
            is_superuser: row.is_superuser,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AccountWithPasswordRow {
    #[sqlx(flatten)]
    account: AccountRow,
    password_hash: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for account database operations.
pub struct AccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an account by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM catalog.account WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get an account by its email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM catalog.account WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get an account together with its password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountWithPasswordRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS}, password_hash FROM catalog.account WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some((row.account.try_into()?, row.password_hash)))
    }

    /// Create an account and run `hook` before committing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns any error produced by `hook`; nothing is persisted in that case.
    pub async fn create<H: AccountCreatedHook>(
        &self,
        input: &NewAccount,
        hook: &H,
    ) -> Result<Account, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r"
            INSERT INTO catalog.account (email, username, password_hash, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ACCOUNT_COLUMNS}
            "
        ))
        .bind(input.email.as_str())
        .bind(&input.username)
        .bind(&input.password_hash)
        .bind(input.is_staff)
        .bind(input.is_superuser)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            map_unique_violation(e, "uq_account_email", || {
                RepositoryError::Conflict("email already exists".to_owned())
            })
        })?;

        let account = Account::try_from(row)?;

        hook.on_account_created(&mut tx, &account).await?;

        tx.commit().await?;

        Ok(account)
    }

    /// Delete an account and everything it owns.
    ///
    /// # Returns
    ///
    /// Returns `true` if the account was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// transaction is rolled back and nothing is removed.
    pub async fn delete(&self, id: AccountId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM catalog.auth_token WHERE account_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r"
            DELETE FROM catalog.product_store ps
            USING catalog.product p
            WHERE ps.product_id = p.id AND p.account_id = $1
            ",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        // Children before parents: product -> category -> group.
        for table in [
            "catalog.product",
            "catalog.category",
            "catalog.product_group",
            "catalog.brand",
            "catalog.store",
        ] {
            sqlx::query(&format!("DELETE FROM {table} WHERE account_id = $1"))
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let result = sqlx::query("DELETE FROM catalog.account WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}

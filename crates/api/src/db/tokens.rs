//! Bearer token storage.
//!
//! Only the hex-encoded SHA-256 digest of a token is persisted. The raw
//! token is returned to the client once and never written anywhere.

use sqlx::PgPool;

use cosmetics_core::AccountId;

use super::RepositoryError;

/// Repository for auth token database operations.
pub struct TokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a token digest for an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, account_id: AccountId, digest: &str) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO catalog.auth_token (digest, account_id) VALUES ($1, $2)")
            .bind(digest)
            .bind(account_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Find the active account owning a token digest.
    ///
    /// Tokens of inactive accounts resolve to `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_account(&self, digest: &str) -> Result<Option<AccountId>, RepositoryError> {
        let id = sqlx::query_scalar::<_, i32>(
            r"
            SELECT a.id
            FROM catalog.auth_token t
            JOIN catalog.account a ON a.id = t.account_id
            WHERE t.digest = $1 AND a.is_active
            ",
        )
        .bind(digest)
        .fetch_optional(self.pool)
        .await?;

        Ok(id.map(AccountId::new))
    }
}

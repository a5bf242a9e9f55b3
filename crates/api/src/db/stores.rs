//! Store repository for database operations.
//!
//! Stores are linked to products through `catalog.product_store`; deleting a
//! store drops those links and leaves the products in place.

use sqlx::PgPool;

use cosmetics_core::{AccountId, StoreId};

use super::{RepositoryError, Window};
use crate::models::Store;

#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: i32,
    name: String,
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Self {
            id: StoreId::new(row.id),
            name: row.name,
        }
    }
}

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Count the stores owned by an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, owner: AccountId) -> Result<i64, RepositoryError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM catalog.store WHERE account_id = $1")
                .bind(owner)
                .fetch_one(self.pool)
                .await?;

        Ok(count)
    }

    /// List one page of an account's stores.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        owner: AccountId,
        window: Window,
    ) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT id, name FROM catalog.store
            WHERE account_id = $1
            ORDER BY name DESC, id ASC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(owner)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a store by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        owner: AccountId,
        id: StoreId,
    ) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            "SELECT id, name FROM catalog.store WHERE id = $1 AND account_id = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, owner: AccountId, name: &str) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            "INSERT INTO catalog.store (account_id, name) VALUES ($1, $2) RETURNING id, name",
        )
        .bind(owner)
        .bind(name)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Rename a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store does not belong to `owner`.
    pub async fn update(
        &self,
        owner: AccountId,
        id: StoreId,
        name: &str,
    ) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            r"
            UPDATE catalog.store SET name = $3
            WHERE id = $1 AND account_id = $2
            RETURNING id, name
            ",
        )
        .bind(id)
        .bind(owner)
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a store and its product links.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn delete(&self, owner: AccountId, id: StoreId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            DELETE FROM catalog.product_store ps
            USING catalog.store s
            WHERE ps.store_id = s.id AND s.id = $1 AND s.account_id = $2
            ",
        )
        .bind(id)
        .bind(owner)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM catalog.store WHERE id = $1 AND account_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}

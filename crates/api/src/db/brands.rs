//! Brand repository for database operations.

use sqlx::PgPool;

use cosmetics_core::{AccountId, BrandId};

use super::{RepositoryError, Window};
use crate::models::Brand;

#[derive(Debug, sqlx::FromRow)]
struct BrandRow {
    id: i32,
    name: String,
}

impl From<BrandRow> for Brand {
    fn from(row: BrandRow) -> Self {
        Self {
            id: BrandId::new(row.id),
            name: row.name,
        }
    }
}

/// Repository for brand database operations.
pub struct BrandRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BrandRepository<'a> {
    /// Create a new brand repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Count the brands owned by an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, owner: AccountId) -> Result<i64, RepositoryError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM catalog.brand WHERE account_id = $1")
                .bind(owner)
                .fetch_one(self.pool)
                .await?;

        Ok(count)
    }

    /// List one page of an account's brands, ordered by name descending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        owner: AccountId,
        window: Window,
    ) -> Result<Vec<Brand>, RepositoryError> {
        let rows = sqlx::query_as::<_, BrandRow>(
            r"
            SELECT id, name FROM catalog.brand
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

    /// Get a brand by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        owner: AccountId,
        id: BrandId,
    ) -> Result<Option<Brand>, RepositoryError> {
        let row = sqlx::query_as::<_, BrandRow>(
            "SELECT id, name FROM catalog.brand WHERE id = $1 AND account_id = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a brand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, owner: AccountId, name: &str) -> Result<Brand, RepositoryError> {
        let row = sqlx::query_as::<_, BrandRow>(
            "INSERT INTO catalog.brand (account_id, name) VALUES ($1, $2) RETURNING id, name",
        )
        .bind(owner)
        .bind(name)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Rename a brand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the brand does not belong to `owner`.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        owner: AccountId,
        id: BrandId,
        name: &str,
    ) -> Result<Brand, RepositoryError> {
        let row = sqlx::query_as::<_, BrandRow>(
            r"
            UPDATE catalog.brand SET name = $3
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

    /// Delete a brand, detaching it from the products that reference it.
    ///
    /// # Returns
    ///
    /// Returns `true` if the brand was deleted, `false` if `owner` has no such brand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn delete(&self, owner: AccountId, id: BrandId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE catalog.product SET brand_id = NULL, updated_at = NOW() WHERE brand_id = $1 AND account_id = $2",
        )
        .bind(id)
        .bind(owner)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM catalog.brand WHERE id = $1 AND account_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}

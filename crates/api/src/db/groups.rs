//! Group repository for database operations.
//!
//! Groups are read with their categories attached. The categories of a page
//! of groups are loaded in one follow-up query rather than one per group.

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};

use cosmetics_core::{AccountId, GroupId};

use super::categories::CategoryRow;
use super::{RepositoryError, Window};
use crate::models::{Category, Group};

#[derive(Debug, sqlx::FromRow)]
struct GroupRow {
    id: i32,
    name: String,
}

/// Repository for group database operations.
pub struct GroupRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> GroupRepository<'a> {
    /// Create a new group repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Count the groups owned by an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, owner: AccountId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM catalog.product_group WHERE account_id = $1",
        )
        .bind(owner)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// List one page of an account's groups with their categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        owner: AccountId,
        window: Window,
    ) -> Result<Vec<Group>, RepositoryError> {
        let rows = sqlx::query_as::<_, GroupRow>(
            r"
            SELECT id, name FROM catalog.product_group
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

        self.attach_categories(owner, rows).await
    }

    /// Get a group by ID with its categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(
        &self,
        owner: AccountId,
        id: GroupId,
    ) -> Result<Option<Group>, RepositoryError> {
        let row = sqlx::query_as::<_, GroupRow>(
            "SELECT id, name FROM catalog.product_group WHERE id = $1 AND account_id = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(self.attach_categories(owner, vec![row]).await?.pop())
    }

    /// Whether `owner` owns the group.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, owner: AccountId, id: GroupId) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM catalog.product_group WHERE id = $1 AND account_id = $2)",
        )
        .bind(id)
        .bind(owner)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Insert a group on an existing connection.
    ///
    /// Used while seeding a new account, inside its creation transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(
        conn: &mut PgConnection,
        owner: AccountId,
        name: &str,
    ) -> Result<GroupId, RepositoryError> {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO catalog.product_group (account_id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(owner)
        .bind(name)
        .fetch_one(conn)
        .await?;

        Ok(GroupId::new(id))
    }

    /// Delete a group together with its products and categories.
    ///
    /// # Returns
    ///
    /// Returns `true` if the group was deleted, `false` if `owner` has no such group.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn delete(&self, owner: AccountId, id: GroupId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let owned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM catalog.product_group WHERE id = $1 AND account_id = $2)",
        )
        .bind(id)
        .bind(owner)
        .fetch_one(&mut *tx)
        .await?;

        if !owned {
            return Ok(false);
        }

        sqlx::query(
            r"
            DELETE FROM catalog.product_store ps
            USING catalog.product p
            WHERE ps.product_id = p.id AND p.group_id = $1
            ",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM catalog.product WHERE group_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM catalog.category WHERE group_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM catalog.product_group WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(group_id = %id, account_id = %owner, "Deleted group");

        Ok(true)
    }

    async fn attach_categories(
        &self,
        owner: AccountId,
        rows: Vec<GroupRow>,
    ) -> Result<Vec<Group>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();

        let category_rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, group_id FROM catalog.category
            WHERE account_id = $1 AND group_id = ANY($2)
            ORDER BY name DESC, id ASC
            ",
        )
        .bind(owner)
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_group: HashMap<i32, Vec<Category>> = HashMap::new();
        for row in category_rows {
            by_group.entry(row.group_id).or_default().push(row.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| Group {
                id: GroupId::new(row.id),
                categories: by_group.remove(&row.id).unwrap_or_default(),
                name: row.name,
            })
            .collect())
    }
}

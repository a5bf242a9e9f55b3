//! Category repository for database operations.
//!
//! Every category lives under one group, and every public method here takes
//! both the owner and the group so a category is only reachable through the
//! path it belongs to.

use sqlx::{PgConnection, PgPool};

use cosmetics_core::{AccountId, CategoryId, GroupId};

use super::{RepositoryError, Window, map_unique_violation};
use crate::models::Category;

const UNIQUE_NAME_CONSTRAINT: &str = "uq_category_name_per_group";

#[derive(Debug, sqlx::FromRow)]
pub(super) struct CategoryRow {
    pub(super) id: i32,
    pub(super) name: String,
    pub(super) group_id: i32,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            group: GroupId::new(row.group_id),
        }
    }
}

fn duplicate_name() -> RepositoryError {
    RepositoryError::invalid("name", "A category with this name already exists in this group.")
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Count the categories of one group.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, owner: AccountId, group: GroupId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM catalog.category WHERE account_id = $1 AND group_id = $2",
        )
        .bind(owner)
        .bind(group)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// List one page of a group's categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        owner: AccountId,
        group: GroupId,
        window: Window,
    ) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, group_id FROM catalog.category
            WHERE account_id = $1 AND group_id = $2
            ORDER BY name DESC, id ASC
            LIMIT $3 OFFSET $4
            ",
        )
        .bind(owner)
        .bind(group)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a category of a group by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        owner: AccountId,
        group: GroupId,
        id: CategoryId,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, group_id FROM catalog.category
            WHERE id = $1 AND account_id = $2 AND group_id = $3
            ",
        )
        .bind(id)
        .bind(owner)
        .bind(group)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a category under a group.
    ///
    /// The caller must already have checked that `owner` owns `group`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` on `name` if the group already has a
    /// category with that name.
    pub async fn create(
        &self,
        owner: AccountId,
        group: GroupId,
        name: &str,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO catalog.category (account_id, group_id, name)
            VALUES ($1, $2, $3)
            RETURNING id, name, group_id
            ",
        )
        .bind(owner)
        .bind(group)
        .bind(name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, UNIQUE_NAME_CONSTRAINT, duplicate_name))?;

        Ok(row.into())
    }

    /// Rename a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category is not in `group` or
    /// not owned by `owner`.
    /// Returns `RepositoryError::Invalid` on `name` if the new name is taken.
    pub async fn update(
        &self,
        owner: AccountId,
        group: GroupId,
        id: CategoryId,
        name: &str,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE catalog.category SET name = $4
            WHERE id = $1 AND account_id = $2 AND group_id = $3
            RETURNING id, name, group_id
            ",
        )
        .bind(id)
        .bind(owner)
        .bind(group)
        .bind(name)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, UNIQUE_NAME_CONSTRAINT, duplicate_name))?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a category, clearing it from the products that reference it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn delete(
        &self,
        owner: AccountId,
        group: GroupId,
        id: CategoryId,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            UPDATE catalog.product p SET category_id = NULL, updated_at = NOW()
            FROM catalog.category c
            WHERE p.category_id = c.id
              AND c.id = $1 AND c.account_id = $2 AND c.group_id = $3
            ",
        )
        .bind(id)
        .bind(owner)
        .bind(group)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            "DELETE FROM catalog.category WHERE id = $1 AND account_id = $2 AND group_id = $3",
        )
        .bind(id)
        .bind(owner)
        .bind(group)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Transaction-scoped helpers
    // =========================================================================

    /// Insert a category on an existing connection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` on `name` if the group already has a
    /// category with that name.
    pub async fn insert(
        conn: &mut PgConnection,
        owner: AccountId,
        group: GroupId,
        name: &str,
    ) -> Result<CategoryId, RepositoryError> {
        let id = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO catalog.category (account_id, group_id, name)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(owner)
        .bind(group)
        .bind(name)
        .fetch_one(conn)
        .await
        .map_err(|e| map_unique_violation(e, UNIQUE_NAME_CONSTRAINT, duplicate_name))?;

        Ok(CategoryId::new(id))
    }

    /// Find the category named `name` in `group`, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    /// Returns `RepositoryError::Conflict` if a category with that name exists
    /// in the group under a different owner.
    pub async fn get_or_create(
        conn: &mut PgConnection,
        owner: AccountId,
        group: GroupId,
        name: &str,
    ) -> Result<CategoryId, RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO catalog.category (account_id, group_id, name)
            VALUES ($1, $2, $3)
            ON CONFLICT ON CONSTRAINT uq_category_name_per_group DO NOTHING
            ",
        )
        .bind(owner)
        .bind(group)
        .bind(name)
        .execute(&mut *conn)
        .await?;

        let id = sqlx::query_scalar::<_, i32>(
            r"
            SELECT id FROM catalog.category
            WHERE account_id = $1 AND group_id = $2 AND name = $3
            ",
        )
        .bind(owner)
        .bind(group)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

        id.map(CategoryId::new).ok_or_else(|| {
            RepositoryError::Conflict(format!(
                "category {name:?} of group {group} is not owned by {owner}"
            ))
        })
    }

    /// Look up the group of a category owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn group_of(
        conn: &mut PgConnection,
        owner: AccountId,
        id: CategoryId,
    ) -> Result<Option<GroupId>, RepositoryError> {
        let group = sqlx::query_scalar::<_, i32>(
            "SELECT group_id FROM catalog.category WHERE id = $1 AND account_id = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(conn)
        .await?;

        Ok(group.map(GroupId::new))
    }
}

//! Category resolution for products saved without a category.

use sqlx::PgConnection;

use cosmetics_core::{AccountId, CategoryId, GroupId};

use crate::db::products::CategoryFallback;
use crate::db::{CategoryRepository, RepositoryError};

/// Name of the catch-all category of a group.
pub const FALLBACK_CATEGORY_NAME: &str = "Other";

/// Resolves to the group's "Other" category, creating it when the owner has
/// deleted it or the group never had one.
#[derive(Debug, Clone, Copy, Default)]
pub struct OtherCategory;

impl CategoryFallback for OtherCategory {
    async fn resolve(
        &self,
        conn: &mut PgConnection,
        owner: AccountId,
        group: GroupId,
    ) -> Result<CategoryId, RepositoryError> {
        let category =
            CategoryRepository::get_or_create(conn, owner, group, FALLBACK_CATEGORY_NAME).await?;

        tracing::debug!(
            account_id = %owner,
            group_id = %group,
            category_id = %category,
            "Resolved fallback category"
        );

        Ok(category)
    }
}

//! Default catalog seeded into every new account.
//!
//! Runs as the [`AccountCreatedHook`] of account creation, so the groups and
//! categories below commit together with the account or not at all.

use sqlx::PgConnection;

use crate::db::{AccountCreatedHook, CategoryRepository, GroupRepository, RepositoryError};
use crate::models::Account;
use crate::services::fallback::FALLBACK_CATEGORY_NAME;

/// Groups created for every account, in creation order.
pub const DEFAULT_GROUP_NAMES: [&str; 5] =
    ["Skin care", "Hair care", "Body care", "Makeup", "Other"];

/// Category seeded under a default group, if any.
///
/// Every default group gets the fallback category except the group that is
/// itself named like it.
fn seeded_category(group_name: &str) -> Option<&'static str> {
    (group_name != FALLBACK_CATEGORY_NAME).then_some(FALLBACK_CATEGORY_NAME)
}

/// Seeds [`DEFAULT_GROUP_NAMES`] and their fallback categories.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCatalog;

impl AccountCreatedHook for DefaultCatalog {
    async fn on_account_created(
        &self,
        conn: &mut PgConnection,
        account: &Account,
    ) -> Result<(), RepositoryError> {
        let mut categories = 0_usize;

        for name in DEFAULT_GROUP_NAMES {
            let group = GroupRepository::insert(conn, account.id, name).await?;

            if let Some(category) = seeded_category(name) {
                CategoryRepository::insert(conn, account.id, group, category).await?;
                categories += 1;
            }
        }

        tracing::debug!(
            account_id = %account.id,
            groups = DEFAULT_GROUP_NAMES.len(),
            categories,
            "Seeded default catalog"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_groups_in_order() {
        assert_eq!(
            DEFAULT_GROUP_NAMES,
            ["Skin care", "Hair care", "Body care", "Makeup", "Other"]
        );
    }

    #[test]
    fn test_every_group_but_other_gets_a_fallback_category() {
        let seeded: Vec<_> = DEFAULT_GROUP_NAMES
            .iter()
            .filter_map(|name| seeded_category(name))
            .collect();

        assert_eq!(seeded, vec!["Other"; 4]);
        assert_eq!(seeded_category("Other"), None);
        assert_eq!(seeded_category("Makeup"), Some("Other"));
    }
}

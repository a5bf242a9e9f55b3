//! Account domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cosmetics_core::{AccountId, Email};

/// A catalog account (domain type).
///
/// The password hash is not carried here; it is only read through
/// [`AccountRepository::get_password_hash`](crate::db::AccountRepository::get_password_hash).
#[derive(Debug, Clone)]
pub struct Account {
    /// Unique account ID.
    pub id: AccountId,
    /// Login email (unique).
    pub email: Email,
    /// Display name.
    pub username: String,
    /// Inactive accounts cannot log in or use existing tokens.
    pub is_active: bool,
    /// Operator flag.
    pub is_staff: bool,
    /// Operator flag with all permissions.
    pub is_superuser: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: Email,
    pub username: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAccount {
    pub id: AccountId,
    pub email: Email,
    pub username: String,
}

impl From<Account> for CurrentAccount {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            username: account.username,
        }
    }
}

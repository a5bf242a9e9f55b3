//! Operator account management.
//!
//! # Usage
//!
//! ```bash
//! # Create an operator account (password from the environment)
//! CATALOG_SUPERUSER_PASSWORD=... cosmetics-cli account create-superuser -e ops@example.com -u ops
//!
//! # Delete an account and its whole catalog
//! cosmetics-cli account delete -e someone@example.com
//! ```

use cosmetics_api::db::AccountRepository;
use cosmetics_api::services::{AuthError, AuthService};
use cosmetics_core::{AccountId, Email};

use super::{CommandError, connect};

/// Environment variable holding the new superuser's password.
const PASSWORD_ENV: &str = "CATALOG_SUPERUSER_PASSWORD";

/// Create a staff superuser. The account gets the same default catalog as
/// a self-registered one.
pub async fn create_superuser(email: &str, username: &str) -> Result<AccountId, CommandError> {
    let pool = connect().await?;

    let password =
        std::env::var(PASSWORD_ENV).map_err(|_| CommandError::MissingEnvVar(PASSWORD_ENV))?;

    let account = AuthService::new(&pool)
        .create_superuser(username, email, &password)
        .await?;

    tracing::info!(account_id = %account.id, "Superuser created: {}", account.email);
    Ok(account.id)
}

/// Delete an account together with everything it owns.
pub async fn delete(email: &str) -> Result<(), CommandError> {
    let parsed = Email::parse(email).map_err(AuthError::from)?;
    let pool = connect().await?;
    let accounts = AccountRepository::new(&pool);

    let account = accounts
        .get_by_email(&parsed)
        .await?
        .ok_or_else(|| CommandError::AccountNotFound(email.to_owned()))?;

    accounts.delete(account.id).await?;

    tracing::info!(account_id = %account.id, "Account deleted: {}", account.email);
    Ok(())
}

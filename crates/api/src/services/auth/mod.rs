//! Authentication service.
//!
//! Password accounts with opaque bearer tokens. A token is 20 random bytes,
//! hex-encoded; only its SHA-256 digest is stored.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::LazyLock;

use sha2::{Digest, Sha256};
use sqlx::PgPool;

use cosmetics_core::Email;

use crate::db::{AccountRepository, RepositoryError, TokenRepository};
use crate::models::account::{Account, CurrentAccount, NewAccount};
use crate::services::bootstrap::DefaultCatalog;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 5;

/// Number of random bytes in an issued token.
const TOKEN_BYTES: usize = 20;

/// Hash checked when the email is unknown, so both rejection paths run Argon2.
static UNKNOWN_ACCOUNT_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("unknown-account").ok());

/// Authentication service.
///
/// Handles registration, login, and bearer token resolution.
pub struct AuthService<'a> {
    accounts: AccountRepository<'a>,
    tokens: TokenRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            accounts: AccountRepository::new(pool),
            tokens: TokenRepository::new(pool),
        }
    }

    /// Register a new account and seed its default catalog.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::AccountAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, AuthError> {
        self.create_account(username, email, password, false).await
    }

    /// Register an operator account with the staff and superuser flags set.
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub async fn create_superuser(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, AuthError> {
        self.create_account(username, email, password, true).await
    }

    async fn create_account(
        &self,
        username: &str,
        email: &str,
        password: &str,
        superuser: bool,
    ) -> Result<Account, AuthError> {
        let email = Email::parse(email)?;

        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let new_account = NewAccount {
            email,
            username: username.to_owned(),
            password_hash,
            is_staff: superuser,
            is_superuser: superuser,
        };

        let account = self
            .accounts
            .create(&new_account, &DefaultCatalog)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::AccountAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(account_id = %account.id, superuser, "Account created");

        Ok(account)
    }

    /// Check credentials and issue a new bearer token.
    ///
    /// Every successful login issues a fresh token; earlier tokens stay valid.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown, the
    /// password is wrong, or the account is inactive.
    pub async fn login(&self, email: &str, password: &str) -> Result<(Account, String), AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Err(reject_unknown_account(password));
        };

        let Some((account, password_hash)) = self.accounts.get_password_hash(&email).await? else {
            return Err(reject_unknown_account(password));
        };

        verify_password(password, &password_hash)?;

        if !account.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        let token = generate_token();
        self.tokens.insert(account.id, &token_digest(&token)).await?;

        tracing::info!(account_id = %account.id, "Token issued");

        Ok((account, token))
    }

    /// Resolve a bearer token to its account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is unknown or belongs
    /// to an inactive account.
    pub async fn authenticate(&self, token: &str) -> Result<CurrentAccount, AuthError> {
        if !is_well_formed(token) {
            return Err(AuthError::InvalidToken);
        }

        let account_id = self
            .tokens
            .find_account(&token_digest(token))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let account = self
            .accounts
            .get_by_id(account_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        Ok(account.into())
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Ensure this field has at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Spend the same Argon2 work as a wrong password before rejecting.
fn reject_unknown_account(password: &str) -> AuthError {
    if let Some(hash) = UNKNOWN_ACCOUNT_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    AuthError::InvalidCredentials
}

fn generate_token() -> String {
    hex::encode(rand::random::<[u8; TOKEN_BYTES]>())
}

fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_BYTES * 2 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

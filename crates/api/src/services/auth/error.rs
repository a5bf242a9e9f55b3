//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] cosmetics_core::EmailError),

    /// Wrong password, unknown email, or inactive account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Bearer token missing, malformed, or not issued to an active account.
    #[error("invalid token")]
    InvalidToken,

    /// Email is already registered.
    #[error("account already exists")]
    AccountAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`.
//!
//! Error bodies are JSON. Validation errors map each offending field to a list
//! of messages (problems not tied to one field go under `non_field_errors`);
//! every other error is `{"detail": "..."}`.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;

/// Key for validation messages that do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

const INVALID_CREDENTIALS: &str = "Unable to authenticate with provided credentials.";

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Create an empty set of errors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors consisting of one message on one field.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a message against `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_owned()).or_default().push(message.into());
    }

    /// Whether no message has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded against `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when empty, otherwise a validation error carrying these messages.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if any message was recorded.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

/// Application-level error type for the catalog API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Request payload or query failed validation.
    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    /// Resource not found, or owned by another account.
    #[error("Not found")]
    NotFound,

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The route exists but does not accept this method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a single-field validation error.
    #[must_use]
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(FieldErrors::single(field, message))
    }

    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(err) | Self::Auth(AuthError::Repository(err)) => matches!(
                err,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_)
            ),
            Self::Auth(AuthError::PasswordHash) | Self::Internal(_) => true,
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        if self.is_server_error() {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }

        match self {
            Self::Database(err) | Self::Auth(AuthError::Repository(err)) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Auth(AuthError::InvalidToken) | Self::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Auth(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        // Don't expose internal error details to clients
        if self.is_server_error() {
            return json!({ "detail": "Internal server error" });
        }

        match self {
            Self::Database(err) | Self::Auth(AuthError::Repository(err)) => match err {
                RepositoryError::NotFound => json!({ "detail": "Not found." }),
                RepositoryError::Invalid { field, message } => json!({ *field: [message] }),
                other => json!({ NON_FIELD_ERRORS: [other.to_string()] }),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_) => json!({ "email": ["Enter a valid email address."] }),
                AuthError::InvalidCredentials => json!({ NON_FIELD_ERRORS: [INVALID_CREDENTIALS] }),
                AuthError::InvalidToken => json!({ "detail": "Invalid token." }),
                AuthError::AccountAlreadyExists => {
                    json!({ "email": ["An account with this email already exists."] })
                }
                AuthError::WeakPassword(msg) => json!({ "password": [msg] }),
                _ => json!({ "detail": "Authentication error" }),
            },
            Self::Validation(errors) => json!(errors),
            Self::NotFound => json!({ "detail": "Not found." }),
            Self::Unauthorized(msg) => json!({ "detail": msg }),
            Self::MethodNotAllowed => json!({ "detail": "Method not allowed." }),
            Self::Internal(_) => json!({ "detail": "Internal server error" }),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid(NON_FIELD_ERRORS, rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        Self::NotFound
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid(NON_FIELD_ERRORS, rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), Json(self.body())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the current request.
///
/// Call this after successful authentication to associate errors with accounts.
pub fn set_sentry_user(account_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(account_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn status_and_body(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_field_errors_collects_messages_per_field() {
        let mut errors = FieldErrors::new();
        assert!(errors.is_empty());

        errors.add("name", "This field is required.");
        errors.add("name", "Too long.");
        errors.add("group", "This field is required.");

        assert_eq!(errors.get("name").unwrap().len(), 2);
        assert!(errors.get("brand").is_none());
        assert!(matches!(errors.into_result(), Err(AppError::Validation(_))));
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[tokio::test]
    async fn test_validation_body_is_keyed_by_field() {
        let (status, body) =
            status_and_body(AppError::invalid("name", "This field is required.")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "name": ["This field is required."] }));
    }

    #[tokio::test]
    async fn test_invalid_credentials_is_a_non_field_error() {
        let (status, body) = status_and_body(AuthError::InvalidCredentials.into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "non_field_errors": ["Unable to authenticate with provided credentials."] })
        );
    }

    #[tokio::test]
    async fn test_repository_errors_map_to_client_statuses() {
        let (status, body) = status_and_body(RepositoryError::NotFound.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "detail": "Not found." }));

        let (status, body) =
            status_and_body(RepositoryError::invalid("category", "Wrong group.").into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "category": ["Wrong group."] }));
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let (status, body) = status_and_body(
            RepositoryError::DataCorruption("bad email in row 7".to_string()).into(),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "detail": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_app_error_status_codes() {
        assert_eq!(
            status_and_body(AppError::NotFound).await.0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_and_body(AppError::Unauthorized("test".to_string())).await.0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_and_body(AuthError::InvalidToken.into()).await.0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_and_body(AppError::MethodNotAllowed).await.0,
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            status_and_body(AuthError::AccountAlreadyExists.into()).await.0,
            StatusCode::BAD_REQUEST
        );
    }
}

//! Registration and token issue.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use super::extract::{ApiJson, BLANK, REQUIRED, required_name};
use crate::error::{AppError, FieldErrors, Result};
use crate::services::AuthService;
use crate::state::AppState;

const MAX_USERNAME_CHARS: usize = 255;

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct TokenPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Public view of a registered account.
#[derive(Debug, Serialize)]
pub struct AccountBody {
    pub username: String,
    pub email: String,
}

/// Issued token with the account it belongs to.
#[derive(Debug, Serialize)]
pub struct TokenBody {
    pub token: String,
    pub username: String,
    pub email: String,
}

/// Record a missing or blank credential field; passwords are not trimmed.
fn required_secret<'a>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&'a str>,
) -> Option<&'a str> {
    match value {
        None => {
            errors.add(field, REQUIRED);
            None
        }
        Some("") => {
            errors.add(field, BLANK);
            None
        }
        Some(value) => Some(value),
    }
}

/// Register a new account.
///
/// POST /api/user/register
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterPayload>,
) -> Result<(StatusCode, Json<AccountBody>)> {
    let mut errors = FieldErrors::new();
    let username = required_name(
        &mut errors,
        "username",
        payload.username.as_deref(),
        MAX_USERNAME_CHARS,
    );
    let email = required_secret(&mut errors, "email", payload.email.as_deref());
    let password = required_secret(&mut errors, "password", payload.password.as_deref());

    let (Some(username), Some(email), Some(password)) = (username, email, password) else {
        return Err(AppError::Validation(errors));
    };

    let account = AuthService::new(state.pool())
        .register(&username, email, password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountBody {
            username: account.username,
            email: account.email.into_inner(),
        }),
    ))
}

/// Exchange email and password for a bearer token.
///
/// POST /api/user/token
#[tracing::instrument(skip_all)]
pub async fn token(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TokenPayload>,
) -> Result<Json<TokenBody>> {
    let mut errors = FieldErrors::new();
    let email = required_secret(&mut errors, "email", payload.email.as_deref());
    let password = required_secret(&mut errors, "password", payload.password.as_deref());

    let (Some(email), Some(password)) = (email, password) else {
        return Err(AppError::Validation(errors));
    };

    let (account, token) = AuthService::new(state.pool()).login(email, password).await?;

    Ok(Json(TokenBody {
        token,
        username: account.username,
        email: account.email.into_inner(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_secret() {
        let mut errors = FieldErrors::new();
        assert_eq!(required_secret(&mut errors, "password", Some(" pw ")), Some(" pw "));
        assert!(errors.is_empty());

        assert_eq!(required_secret(&mut errors, "password", Some("")), None);
        assert_eq!(required_secret(&mut errors, "email", None), None);
        assert_eq!(errors.get("password"), Some(&[BLANK.to_string()][..]));
        assert_eq!(errors.get("email"), Some(&[REQUIRED.to_string()][..]));
    }
}

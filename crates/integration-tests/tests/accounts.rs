//! Registration, token issue, and the default catalog of new accounts.
//!
//! These tests require a `PostgreSQL` database named by `DATABASE_URL`.
//!
//! Run with: cargo test -p cosmetics-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use axum::http::{Method, StatusCode};
use serde_json::json;
use sqlx::PgConnection;

use cosmetics_api::db::{AccountCreatedHook, AccountRepository, GroupRepository, RepositoryError};
use cosmetics_api::models::{Account, NewAccount};
use cosmetics_core::{AccountId, Email};
use cosmetics_integration_tests::{DEFAULT_GROUPS, PASSWORD, TestContext, unique_email};

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_register_returns_public_fields() {
    let ctx = TestContext::new().await;
    let email = unique_email();

    let response = ctx.register(&email, PASSWORD).await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body, json!({ "username": "tester", "email": email }));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_new_account_owns_default_catalog() {
    let ctx = TestContext::new().await;
    let account = ctx.account().await;

    let groups = ctx.groups(&account).await;
    assert_eq!(groups.len(), DEFAULT_GROUPS.len());

    for name in DEFAULT_GROUPS {
        let group = groups.iter().find(|g| g["name"] == name).unwrap();
        let categories = group["categories"].as_array().unwrap();

        if name == "Other" {
            assert!(categories.is_empty(), "the Other group starts empty");
        } else {
            assert_eq!(categories.len(), 1, "{name}");
            assert_eq!(categories[0]["name"], "Other");
            assert_eq!(categories[0]["group"], group["id"]);
        }
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_groups_listed_by_name_descending() {
    let ctx = TestContext::new().await;
    let account = ctx.account().await;

    let names: Vec<String> = ctx
        .groups(&account)
        .await
        .iter()
        .map(|g| g["name"].as_str().unwrap().to_owned())
        .collect();

    assert_eq!(names, ["Skin care", "Other", "Makeup", "Hair care", "Body care"]);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_short_password_creates_nothing() {
    let ctx = TestContext::new().await;
    let email = unique_email();

    let response = ctx.register(&email, "tp").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body,
        json!({ "password": ["Ensure this field has at least 5 characters."] })
    );

    let stored = AccountRepository::new(&ctx.pool)
        .get_by_email(&Email::parse(&email).unwrap())
        .await
        .unwrap();
    assert!(stored.is_none());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_duplicate_email_is_rejected() {
    let ctx = TestContext::new().await;
    let account = ctx.account().await;

    let response = ctx.register(&account.email, PASSWORD).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["email"].is_array());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_wrong_password_gets_no_token() {
    let ctx = TestContext::new().await;
    let account = ctx.account().await;

    let response = ctx
        .request(
            Method::POST,
            "/api/user/token",
            None,
            Some(json!({ "email": account.email, "password": "not-the-password" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["non_field_errors"].is_array());
    assert!(response.body.get("token").is_none());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_unknown_token_is_unauthorized() {
    let ctx = TestContext::new().await;

    let response = ctx
        .request(Method::GET, "/api/groups", Some(&"ab".repeat(20)), None)
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_deleted_account_token_stops_working() {
    let ctx = TestContext::new().await;
    let account = ctx.account().await;
    ctx.create_named(&account, "/api/brands", "Gone").await;

    let accounts = AccountRepository::new(&ctx.pool);
    let stored = accounts
        .get_by_email(&Email::parse(&account.email).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(accounts.delete(stored.id).await.unwrap());

    let response = ctx.get(&account, "/api/brands").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

/// Seeds one group, then fails.
#[derive(Default)]
struct FailingCatalog {
    seeded_for: Mutex<Option<AccountId>>,
}

impl AccountCreatedHook for FailingCatalog {
    async fn on_account_created(
        &self,
        conn: &mut PgConnection,
        account: &Account,
    ) -> Result<(), RepositoryError> {
        GroupRepository::insert(conn, account.id, "Skin care").await?;
        *self.seeded_for.lock().unwrap() = Some(account.id);
        Err(RepositoryError::NotFound)
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_failed_bootstrap_leaves_no_account() {
    let ctx = TestContext::new().await;
    let email = Email::parse(&unique_email()).unwrap();
    let hook = FailingCatalog::default();

    let result = AccountRepository::new(&ctx.pool)
        .create(
            &NewAccount {
                email: email.clone(),
                username: "tester".to_owned(),
                password_hash: "unused".to_owned(),
                is_staff: false,
                is_superuser: false,
            },
            &hook,
        )
        .await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));

    let stored = AccountRepository::new(&ctx.pool)
        .get_by_email(&email)
        .await
        .unwrap();
    assert!(stored.is_none());

    let account_id = hook.seeded_for.lock().unwrap().unwrap();
    let groups: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM catalog.product_group WHERE account_id = $1")
            .bind(account_id)
            .fetch_one(&ctx.pool)
            .await
            .unwrap();
    assert_eq!(groups, 0);
}

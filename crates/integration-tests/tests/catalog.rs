//! Catalog behavior across brands, stores, groups, categories and products.
//!
//! These tests require a `PostgreSQL` database named by `DATABASE_URL`.
//!
//! Run with: cargo test -p cosmetics-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use cosmetics_api::db::{AccountRepository, GroupRepository};
use cosmetics_core::{Email, GroupId};
use cosmetics_integration_tests::{TestAccount, TestContext};

/// ID of the "Other" category seeded into a group.
async fn other_category(ctx: &TestContext, account: &TestAccount, group: i64) -> i64 {
    let response = ctx
        .get(account, &format!("/api/groups/{group}/categories"))
        .await;
    response.body["results"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "Other")
        .and_then(|c| c["id"].as_i64())
        .unwrap()
}

fn ids(list: &Value) -> Vec<i64> {
    list["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}

// ============================================================================
// Category fallback
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_product_without_category_lands_in_other() {
    let ctx = TestContext::new().await;
    let account = ctx.account().await;
    let skin = ctx.group_id(&account, "Skin care").await;
    let other = other_category(&ctx, &account, skin).await;

    let product = ctx
        .create_product(&account, json!({ "name": "Serum", "group": skin }))
        .await;
    assert_eq!(product["category"], other);

    // Re-saving keeps the same fallback category and creates no duplicate.
    let id = product["id"].as_i64().unwrap();
    let updated = ctx
        .send(
            &account,
            Method::PATCH,
            &format!("/api/products/{id}"),
            json!({ "category": null }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["category"], other);

    let categories = ctx
        .get(&account, &format!("/api/groups/{skin}/categories"))
        .await;
    assert_eq!(categories.body["count"], 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_fallback_recreates_deleted_other_category() {
    let ctx = TestContext::new().await;
    let account = ctx.account().await;
    let hair = ctx.group_id(&account, "Hair care").await;
    let other = other_category(&ctx, &account, hair).await;

    let deleted = ctx
        .delete(&account, &format!("/api/groups/{hair}/categories/{other}"))
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let product = ctx
        .create_product(&account, json!({ "name": "Shampoo", "group": hair }))
        .await;
    let recreated = other_category(&ctx, &account, hair).await;

    assert_ne!(recreated, other);
    assert_eq!(product["category"], recreated);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_group_change_moves_product_to_new_fallback() {
    let ctx = TestContext::new().await;
    let account = ctx.account().await;
    let skin = ctx.group_id(&account, "Skin care").await;
    let makeup = ctx.group_id(&account, "Makeup").await;
    let makeup_other = other_category(&ctx, &account, makeup).await;

    let product = ctx
        .create_product(&account, json!({ "name": "Balm", "group": skin }))
        .await;
    let id = product["id"].as_i64().unwrap();

    let moved = ctx
        .send(
            &account,
            Method::PATCH,
            &format!("/api/products/{id}"),
            json!({ "group": makeup }),
        )
        .await;

    assert_eq!(moved.status, StatusCode::OK, "{:?}", moved.body);
    assert_eq!(moved.body["group"], makeup);
    assert_eq!(moved.body["category"], makeup_other);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_category_from_other_group_is_rejected() {
    let ctx = TestContext::new().await;
    let account = ctx.account().await;
    let skin = ctx.group_id(&account, "Skin care").await;
    let body = ctx.group_id(&account, "Body care").await;
    let body_other = other_category(&ctx, &account, body).await;

    let response = ctx
        .send(
            &account,
            Method::POST,
            "/api/products",
            json!({ "name": "Mix", "group": skin, "category": body_other, "capacity": "10" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["category"].is_array());
}

// ============================================================================
// Account isolation
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_other_accounts_entities_are_not_found() {
    let ctx = TestContext::new().await;
    let owner = ctx.account().await;
    let intruder = ctx.account().await;

    let brand = ctx.create_named(&owner, "/api/brands", "Owned").await;
    let store = ctx.create_named(&owner, "/api/stores", "Owned").await;
    let group = ctx.group_id(&owner, "Makeup").await;
    let category = ctx
        .create_named(&owner, &format!("/api/groups/{group}/categories"), "Lipstick")
        .await;
    let product = ctx
        .create_product(&owner, json!({ "name": "Red", "group": group }))
        .await["id"]
        .as_i64()
        .unwrap();

    let paths = [
        format!("/api/brands/{brand}"),
        format!("/api/stores/{store}"),
        format!("/api/groups/{group}"),
        format!("/api/groups/{group}/categories/{category}"),
        format!("/api/products/{product}"),
    ];

    for path in &paths {
        assert_eq!(ctx.get(&intruder, path).await.status, StatusCode::NOT_FOUND, "GET {path}");
        let patched = ctx
            .send(&intruder, Method::PATCH, path, json!({ "name": "Mine" }))
            .await;
        // Groups are read-only for everyone.
        if path.ends_with(&format!("/api/groups/{group}")) {
            assert_eq!(patched.status, StatusCode::METHOD_NOT_ALLOWED);
        } else {
            assert_eq!(patched.status, StatusCode::NOT_FOUND, "PATCH {path}");
            assert_eq!(ctx.delete(&intruder, path).await.status, StatusCode::NOT_FOUND);
        }
    }

    // Nothing was changed or removed.
    for path in &paths {
        let seen = ctx.get(&owner, path).await;
        assert_eq!(seen.status, StatusCode::OK, "{path}");
        assert_ne!(seen.body["name"], "Mine");
    }

    let listed = ctx
        .get(&intruder, &format!("/api/groups/{group}/categories"))
        .await;
    assert_eq!(listed.status, StatusCode::NOT_FOUND);
    assert_eq!(ctx.get(&intruder, "/api/brands").await.body["count"], 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_category_is_not_found_under_another_group() {
    let ctx = TestContext::new().await;
    let account = ctx.account().await;
    let skin = ctx.group_id(&account, "Skin care").await;
    let hair = ctx.group_id(&account, "Hair care").await;
    let category = ctx
        .create_named(&account, &format!("/api/groups/{skin}/categories"), "Toners")
        .await;

    let wrong_path = format!("/api/groups/{hair}/categories/{category}");
    assert_eq!(ctx.get(&account, &wrong_path).await.status, StatusCode::NOT_FOUND);
    let patched = ctx
        .send(&account, Method::PATCH, &wrong_path, json!({ "name": "Moved" }))
        .await;
    assert_eq!(patched.status, StatusCode::NOT_FOUND);
    assert_eq!(ctx.delete(&account, &wrong_path).await.status, StatusCode::NOT_FOUND);

    let kept = ctx
        .get(&account, &format!("/api/groups/{skin}/categories/{category}"))
        .await;
    assert_eq!(kept.status, StatusCode::OK);
    assert_eq!(kept.body["name"], "Toners");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_product_cannot_reference_foreign_brand() {
    let ctx = TestContext::new().await;
    let owner = ctx.account().await;
    let intruder = ctx.account().await;
    let foreign_brand = ctx.create_named(&owner, "/api/brands", "Theirs").await;
    let group = ctx.group_id(&intruder, "Skin care").await;

    let response = ctx
        .send(
            &intruder,
            Method::POST,
            "/api/products",
            json!({ "name": "Copy", "group": group, "brand": foreign_brand, "capacity": "5" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body,
        json!({ "brand": [format!("Invalid pk \"{foreign_brand}\" - object does not exist.")] })
    );
}

// ============================================================================
// Uniqueness and deletion rules
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_category_names_unique_within_group() {
    let ctx = TestContext::new().await;
    let account = ctx.account().await;
    let skin = ctx.group_id(&account, "Skin care").await;
    let hair = ctx.group_id(&account, "Hair care").await;

    ctx.create_named(&account, &format!("/api/groups/{skin}/categories"), "Toner")
        .await;

    let duplicate = ctx
        .send(
            &account,
            Method::POST,
            &format!("/api/groups/{skin}/categories"),
            json!({ "name": "Toner" }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert!(duplicate.body["name"].is_array());

    // The same name is fine in another group.
    ctx.create_named(&account, &format!("/api/groups/{hair}/categories"), "Toner")
        .await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_deleting_brand_or_category_keeps_products() {
    let ctx = TestContext::new().await;
    let account = ctx.account().await;
    let group = ctx.group_id(&account, "Body care").await;
    let brand = ctx.create_named(&account, "/api/brands", "Acme").await;
    let category = ctx
        .create_named(&account, &format!("/api/groups/{group}/categories"), "Lotion")
        .await;

    let product = ctx
        .create_product(
            &account,
            json!({ "name": "Cream", "group": group, "brand": brand, "category": category }),
        )
        .await;
    let path = format!("/api/products/{}", product["id"]);

    let deleted = ctx.delete(&account, &format!("/api/brands/{brand}")).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let after_brand = ctx.get(&account, &path).await;
    assert_eq!(after_brand.status, StatusCode::OK);
    assert_eq!(after_brand.body["brand"], Value::Null);
    assert_eq!(after_brand.body["category"], category);

    let deleted = ctx
        .delete(&account, &format!("/api/groups/{group}/categories/{category}"))
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let after_category = ctx.get(&account, &path).await;
    assert_eq!(after_category.status, StatusCode::OK);
    assert_eq!(after_category.body["category"], Value::Null);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_deleting_store_unlinks_products() {
    let ctx = TestContext::new().await;
    let account = ctx.account().await;
    let group = ctx.group_id(&account, "Makeup").await;
    let kept = ctx.create_named(&account, "/api/stores", "Kept").await;
    let gone = ctx.create_named(&account, "/api/stores", "Gone").await;

    let product = ctx
        .create_product(
            &account,
            json!({ "name": "Mascara", "group": group, "stores": [gone, kept, gone] }),
        )
        .await;
    let mut expected = vec![kept, gone];
    expected.sort_unstable();
    assert_eq!(product["stores"], json!(expected));

    ctx.delete(&account, &format!("/api/stores/{gone}")).await;

    let after = ctx
        .get(&account, &format!("/api/products/{}", product["id"]))
        .await;
    assert_eq!(after.body["stores"], json!([kept]));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_put_keeps_fields_it_does_not_mention() {
    let ctx = TestContext::new().await;
    let account = ctx.account().await;
    let group = ctx.group_id(&account, "Makeup").await;
    let brand = ctx.create_named(&account, "/api/brands", "Acme").await;
    let store = ctx.create_named(&account, "/api/stores", "Corner").await;

    let product = ctx
        .create_product(
            &account,
            json!({
                "name": "Blush",
                "group": group,
                "brand": brand,
                "stores": [store],
                "is_favourite": true,
            }),
        )
        .await;
    let path = format!("/api/products/{}", product["id"]);

    let replaced = ctx
        .send(
            &account,
            Method::PUT,
            &path,
            json!({ "name": "Bronzer", "group": group, "capacity": "12.50" }),
        )
        .await;
    assert_eq!(replaced.status, StatusCode::OK, "{:?}", replaced.body);
    assert_eq!(replaced.body["name"], "Bronzer");
    assert_eq!(replaced.body["capacity"], "12.50");
    assert_eq!(replaced.body["brand"], brand);
    assert_eq!(replaced.body["stores"], json!([store]));
    assert_eq!(replaced.body["is_favourite"], true);

    let missing = ctx
        .send(&account, Method::PUT, &path, json!({ "name": "Bronzer" }))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert!(missing.body["group"].is_array());
    assert!(missing.body["capacity"].is_array());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_deleting_group_deletes_its_products() {
    let ctx = TestContext::new().await;
    let account = ctx.account().await;
    let group = ctx.group_id(&account, "Hair care").await;
    let survivor_group = ctx.group_id(&account, "Skin care").await;

    let doomed = ctx
        .create_product(&account, json!({ "name": "Gel", "group": group }))
        .await;
    let survivor = ctx
        .create_product(&account, json!({ "name": "Mask", "group": survivor_group }))
        .await;

    let owner = AccountRepository::new(&ctx.pool)
        .get_by_email(&Email::parse(&account.email).unwrap())
        .await
        .unwrap()
        .unwrap();
    let removed = GroupRepository::new(&ctx.pool)
        .delete(owner.id, GroupId::new(i32::try_from(group).unwrap()))
        .await
        .unwrap();
    assert!(removed);

    let gone = ctx
        .get(&account, &format!("/api/products/{}", doomed["id"]))
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    let kept = ctx
        .get(&account, &format!("/api/products/{}", survivor["id"]))
        .await;
    assert_eq!(kept.status, StatusCode::OK);
    assert_eq!(ctx.groups(&account).await.len(), 4);
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_brand_pagination() {
    let ctx = TestContext::new().await;
    let account = ctx.account().await;
    for name in ["Alpha", "Bravo", "Charlie"] {
        ctx.create_named(&account, "/api/brands", name).await;
    }

    let first = ctx.get(&account, "/api/brands?page_size=2").await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["count"], 3);
    assert_eq!(first.body["previous"], Value::Null);
    assert_eq!(first.body["next"], 2);
    let names: Vec<&str> = first.body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Charlie", "Bravo"]);

    let second = ctx.get(&account, "/api/brands?page_size=2&page=2").await;
    assert_eq!(ids(&second.body).len(), 1);
    assert_eq!(second.body["next"], Value::Null);

    let past_end = ctx.get(&account, "/api/brands?page_size=2&page=3").await;
    assert_eq!(past_end.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_product_filters() {
    let ctx = TestContext::new().await;
    let account = ctx.account().await;
    let skin = ctx.group_id(&account, "Skin care").await;
    let hair = ctx.group_id(&account, "Hair care").await;
    let brand = ctx.create_named(&account, "/api/brands", "Filtered").await;
    let store = ctx.create_named(&account, "/api/stores", "Corner").await;

    let branded = ctx
        .create_product(
            &account,
            json!({ "name": "A", "group": skin, "brand": brand, "is_favourite": true }),
        )
        .await["id"]
        .as_i64()
        .unwrap();
    let stocked = ctx
        .create_product(
            &account,
            json!({ "name": "B", "group": hair, "stores": [store], "is_available": false }),
        )
        .await["id"]
        .as_i64()
        .unwrap();

    let by_brand = ctx.get(&account, &format!("/api/products?brand={brand}")).await;
    assert_eq!(ids(&by_brand.body), [branded]);

    let by_group = ctx.get(&account, &format!("/api/products?group={hair}")).await;
    assert_eq!(ids(&by_group.body), [stocked]);

    let by_store = ctx.get(&account, &format!("/api/products?store={store}")).await;
    assert_eq!(ids(&by_store.body), [stocked]);

    let favourites = ctx.get(&account, "/api/products?is_favourite=true").await;
    assert_eq!(ids(&favourites.body), [branded]);

    let unavailable = ctx.get(&account, "/api/products?is_available=false").await;
    assert_eq!(ids(&unavailable.body), [stocked]);

    let bad = ctx.get(&account, "/api/products?brand=abc").await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert!(bad.body["brand"].is_array());
}

// ============================================================================
// End-to-end walk-through
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_new_user_walkthrough() {
    let ctx = TestContext::new().await;
    let account = ctx.account().await;
    let neighbour = ctx.account().await;

    let groups = ctx.groups(&account).await;
    assert_eq!(groups.len(), 5);
    let others: usize = groups
        .iter()
        .map(|g| g["categories"].as_array().unwrap().len())
        .sum();
    assert_eq!(others, 4);

    let skin = ctx.group_id(&account, "Skin care").await;
    let product = ctx
        .create_product(&account, json!({ "name": "X", "group": skin }))
        .await;
    let category = ctx
        .get(
            &account,
            &format!("/api/groups/{skin}/categories/{}", product["category"]),
        )
        .await;
    assert_eq!(category.body["name"], "Other");

    let put_group = ctx
        .send(&account, Method::PUT, &format!("/api/groups/{skin}"), json!({ "name": "Y" }))
        .await;
    assert_eq!(put_group.status, StatusCode::METHOD_NOT_ALLOWED);

    let their_store = ctx.create_named(&neighbour, "/api/stores", "Theirs").await;
    let denied = ctx
        .delete(&account, &format!("/api/stores/{their_store}"))
        .await;
    assert_eq!(denied.status, StatusCode::NOT_FOUND);
    let still_there = ctx
        .get(&neighbour, &format!("/api/stores/{their_store}"))
        .await;
    assert_eq!(still_there.status, StatusCode::OK);
}

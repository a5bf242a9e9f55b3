//! Product CRUD handlers.
//!
//! A product saved without a category gets the "Other" category of its
//! group. Moving a product to another group without naming a category
//! clears the old category so the new group's fallback applies.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use cosmetics_core::{BrandId, CategoryId, GroupId, PriceTier, ProductId, StoreId, UnitTier};

use super::extract::{
    ApiJson, ApiPath, ApiQuery, PageQuery, Paginated, REQUIRED, checked_name, double_option,
    required_name,
};
use super::method_not_allowed;
use crate::db::ProductRepository;
use crate::error::{AppError, FieldErrors, Result};
use crate::middleware::RequireAuth;
use crate::models::{Product, ProductFilter, ProductInput};
use crate::services::OtherCategory;
use crate::state::AppState;

const MAX_PRODUCT_NAME_CHARS: usize = 255;

/// Capacity is stored as `NUMERIC(10, 2)`.
const CAPACITY_SCALE: u32 = 2;
const CAPACITY_MAX_INTEGER_DIGITS: u32 = 8;

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/products",
            get(list).post(create).fallback(method_not_allowed),
        )
        .route(
            "/api/products/{id}",
            get(show)
                .put(replace)
                .patch(update)
                .delete(destroy)
                .fallback(method_not_allowed),
        )
}

// =============================================================================
// Query
// =============================================================================

/// Pagination and filter parameters of the product list.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    #[serde(flatten)]
    pub page: PageQuery,
    pub group: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub store: Option<String>,
    pub is_available: Option<String>,
    pub is_favourite: Option<String>,
}

impl ProductQuery {
    /// Parse the filter parameters; empty values are ignored.
    fn filter(&self) -> Result<ProductFilter> {
        let mut errors = FieldErrors::new();

        let filter = ProductFilter {
            group: parse_id_param(&mut errors, "group", self.group.as_deref()).map(GroupId::new),
            category: parse_id_param(&mut errors, "category", self.category.as_deref())
                .map(CategoryId::new),
            brand: parse_id_param(&mut errors, "brand", self.brand.as_deref()).map(BrandId::new),
            store: parse_id_param(&mut errors, "store", self.store.as_deref()).map(StoreId::new),
            is_available: parse_bool_param(
                &mut errors,
                "is_available",
                self.is_available.as_deref(),
            ),
            is_favourite: parse_bool_param(
                &mut errors,
                "is_favourite",
                self.is_favourite.as_deref(),
            ),
        };

        errors.into_result()?;
        Ok(filter)
    }
}

fn parse_id_param(errors: &mut FieldErrors, field: &str, raw: Option<&str>) -> Option<i32> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;
    match raw.parse::<i32>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, "Enter a number.");
            None
        }
    }
}

fn parse_bool_param(errors: &mut FieldErrors, field: &str, raw: Option<&str>) -> Option<bool> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => {
            errors.add(field, "Enter a valid boolean.");
            None
        }
    }
}

// =============================================================================
// Payload
// =============================================================================

/// Product create/update body.
///
/// Every field is optional here; which ones are required depends on whether
/// the request creates, replaces, or patches.
#[derive(Debug, Default, Deserialize)]
pub struct ProductPayload {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub brand: Option<Option<BrandId>>,
    pub group: Option<GroupId>,
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<CategoryId>>,
    #[serde(default, deserialize_with = "double_option")]
    pub price: Option<Option<String>>,
    pub ingredients: Option<String>,
    pub capacity: Option<Decimal>,
    pub unit: Option<String>,
    pub stores: Option<Vec<StoreId>>,
    pub is_available: Option<bool>,
    pub is_favourite: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub image: Option<Option<String>>,
}

/// How a payload is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// `name`, `group` and `capacity` are required.
    Full,
    /// Absent fields keep their current value.
    Partial,
}

impl ProductPayload {
    /// Validate the payload and merge it over `current` (if any).
    fn into_input(self, current: Option<ProductInput>, mode: Mode) -> Result<ProductInput> {
        let mut errors = FieldErrors::new();
        let require = mode == Mode::Full || current.is_none();

        let name = match (&self.name, require) {
            (Some(name), _) => checked_name(&mut errors, "name", name, MAX_PRODUCT_NAME_CHARS),
            (None, true) => required_name(&mut errors, "name", None, MAX_PRODUCT_NAME_CHARS),
            (None, false) => None,
        };

        if self.group.is_none() && require {
            errors.add("group", REQUIRED);
        }

        if self.capacity.is_none() && require {
            errors.add("capacity", REQUIRED);
        }
        let capacity = self
            .capacity
            .and_then(|capacity| check_capacity(&mut errors, capacity));

        let price = match self.price {
            Some(Some(raw)) => parse_choice::<PriceTier>(&mut errors, "price", &raw),
            Some(None) => Some(PriceTier::default()),
            None => None,
        };
        let unit = self
            .unit
            .and_then(|raw| parse_choice::<UnitTier>(&mut errors, "unit", &raw));

        errors.into_result()?;

        let mut input = current.unwrap_or_else(|| ProductInput {
            name: String::new(),
            brand: None,
            group: GroupId::new(0),
            category: None,
            price: PriceTier::default(),
            ingredients: String::new(),
            capacity: Decimal::ZERO,
            unit: UnitTier::default(),
            stores: Vec::new(),
            is_available: true,
            is_favourite: false,
            image: None,
        });

        if let Some(name) = name {
            input.name = name;
        }
        if let Some(brand) = self.brand {
            input.brand = brand;
        }
        if let Some(group) = self.group {
            if group != input.group && self.category.is_none() {
                input.category = None;
            }
            input.group = group;
        }
        if let Some(category) = self.category {
            input.category = category;
        }
        if let Some(price) = price {
            input.price = price;
        }
        if let Some(ingredients) = self.ingredients {
            input.ingredients = ingredients;
        }
        if let Some(capacity) = capacity {
            input.capacity = capacity;
        }
        if let Some(unit) = unit {
            input.unit = unit;
        }
        if let Some(mut stores) = self.stores {
            stores.sort_unstable();
            stores.dedup();
            input.stores = stores;
        }
        if let Some(is_available) = self.is_available {
            input.is_available = is_available;
        }
        if let Some(is_favourite) = self.is_favourite {
            input.is_favourite = is_favourite;
        }
        if let Some(image) = self.image {
            input.image = image.filter(|image| !image.trim().is_empty());
        }

        Ok(input)
    }
}

fn check_capacity(errors: &mut FieldErrors, capacity: Decimal) -> Option<Decimal> {
    let capacity = capacity.normalize();
    if capacity.is_sign_negative() && !capacity.is_zero() {
        errors.add("capacity", "Ensure this value is greater than or equal to 0.");
        return None;
    }
    if capacity.scale() > CAPACITY_SCALE {
        errors.add(
            "capacity",
            format!("Ensure that there are no more than {CAPACITY_SCALE} decimal places."),
        );
        return None;
    }
    if capacity.trunc() >= Decimal::from(10_i64.pow(CAPACITY_MAX_INTEGER_DIGITS)) {
        errors.add(
            "capacity",
            format!(
                "Ensure that there are no more than {CAPACITY_MAX_INTEGER_DIGITS} digits before the decimal point."
            ),
        );
        return None;
    }
    Some(capacity.abs())
}

fn parse_choice<T: std::str::FromStr>(
    errors: &mut FieldErrors,
    field: &str,
    raw: &str,
) -> Option<T> {
    if let Ok(value) = raw.parse::<T>() {
        Some(value)
    } else {
        errors.add(field, format!("\"{raw}\" is not a valid choice."));
        None
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/products
pub async fn list(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<Json<Paginated<Product>>> {
    let filter = query.filter()?;
    let page = query.page.resolve(state.config().default_page_size)?;
    let products = ProductRepository::new(state.pool());

    let count = products.count(account.id, &filter).await?;
    page.ensure_exists(count)?;
    let results = products.list(account.id, &filter, page.window()).await?;

    Ok(Json(page.wrap(count, results)))
}

/// POST /api/products
pub async fn create(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ProductPayload>,
) -> Result<(StatusCode, Json<Product>)> {
    let input = payload.into_input(None, Mode::Full)?;
    let product = ProductRepository::new(state.pool())
        .create(account.id, &input, &OtherCategory)
        .await?;

    tracing::info!(
        account_id = %account.id,
        product_id = %product.id,
        group_id = %product.group,
        "Product created"
    );

    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /api/products/{id}
pub async fn show(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(account.id, id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

/// PUT /api/products/{id}
pub async fn replace(
    auth: RequireAuth,
    state: State<AppState>,
    id: ApiPath<ProductId>,
    ApiJson(payload): ApiJson<ProductPayload>,
) -> Result<Json<Product>> {
    save(auth, state, id, payload, Mode::Full).await
}

/// PATCH /api/products/{id}
pub async fn update(
    auth: RequireAuth,
    state: State<AppState>,
    id: ApiPath<ProductId>,
    ApiJson(payload): ApiJson<ProductPayload>,
) -> Result<Json<Product>> {
    save(auth, state, id, payload, Mode::Partial).await
}

async fn save(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    payload: ProductPayload,
    mode: Mode,
) -> Result<Json<Product>> {
    let products = ProductRepository::new(state.pool());
    let current = products
        .get(account.id, id)
        .await?
        .ok_or(AppError::NotFound)?;

    let input = payload.into_input(Some(current.into()), mode)?;
    let product = products
        .update(account.id, id, &input, &OtherCategory)
        .await?;

    tracing::info!(account_id = %account.id, product_id = %id, "Product updated");

    Ok(Json(product))
}

/// DELETE /api/products/{id}
pub async fn destroy(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    if !ProductRepository::new(state.pool()).delete(account.id, id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(account_id = %account.id, product_id = %id, "Product deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;

    use super::*;

    fn payload(value: serde_json::Value) -> ProductPayload {
        serde_json::from_value(value).unwrap()
    }

    fn validation_errors(result: Result<ProductInput>) -> FieldErrors {
        match result {
            Err(AppError::Validation(errors)) => errors,
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    fn existing() -> ProductInput {
        ProductInput {
            name: "Cleanser".to_string(),
            brand: Some(BrandId::new(3)),
            group: GroupId::new(1),
            category: Some(CategoryId::new(10)),
            price: PriceTier::High,
            ingredients: "water".to_string(),
            capacity: Decimal::from(150),
            unit: UnitTier::Ml,
            stores: vec![StoreId::new(2)],
            is_available: true,
            is_favourite: true,
            image: None,
        }
    }

    #[test]
    fn test_create_applies_defaults() {
        let input = payload(json!({ "name": "X", "group": 1, "capacity": "50" }))
            .into_input(None, Mode::Full)
            .unwrap();

        assert_eq!(input.name, "X");
        assert_eq!(input.group, GroupId::new(1));
        assert_eq!(input.category, None);
        assert_eq!(input.price, PriceTier::Medium);
        assert_eq!(input.unit, UnitTier::Ml);
        assert!(input.is_available);
        assert!(!input.is_favourite);
        assert!(input.stores.is_empty());
    }

    #[test]
    fn test_create_requires_name_group_capacity() {
        let errors = validation_errors(payload(json!({})).into_input(None, Mode::Full));

        for field in ["name", "group", "capacity"] {
            assert_eq!(errors.get(field).unwrap(), [REQUIRED], "{field}");
        }
    }

    #[test]
    fn test_invalid_choices_and_capacity() {
        let errors = validation_errors(
            payload(json!({
                "name": "X",
                "group": 1,
                "capacity": "-1",
                "price": "cheap",
                "unit": "litre",
            }))
            .into_input(None, Mode::Full),
        );

        assert!(errors.get("capacity").is_some());
        assert_eq!(errors.get("price").unwrap(), ["\"cheap\" is not a valid choice."]);
        assert_eq!(errors.get("unit").unwrap(), ["\"litre\" is not a valid choice."]);
    }

    #[test]
    fn test_capacity_precision() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            check_capacity(&mut errors, Decimal::from_str("12.50").unwrap()),
            Some(Decimal::from_str("12.5").unwrap())
        );
        assert_eq!(check_capacity(&mut errors, Decimal::ZERO), Some(Decimal::ZERO));
        assert!(errors.is_empty());

        assert_eq!(check_capacity(&mut errors, Decimal::from_str("1.005").unwrap()), None);
        assert_eq!(check_capacity(&mut errors, Decimal::from(100_000_000)), None);
        assert_eq!(errors.get("capacity").unwrap().len(), 2);
    }

    #[test]
    fn test_patch_keeps_unmentioned_fields() {
        let input = payload(json!({ "is_favourite": false }))
            .into_input(Some(existing()), Mode::Partial)
            .unwrap();

        assert!(!input.is_favourite);
        assert_eq!(input.name, "Cleanser");
        assert_eq!(input.category, Some(CategoryId::new(10)));
        assert_eq!(input.brand, Some(BrandId::new(3)));
    }

    #[test]
    fn test_patch_null_clears_brand_and_category() {
        let input = payload(json!({ "brand": null, "category": null }))
            .into_input(Some(existing()), Mode::Partial)
            .unwrap();

        assert_eq!(input.brand, None);
        assert_eq!(input.category, None);
    }

    #[test]
    fn test_group_change_clears_category_unless_given() {
        let moved = payload(json!({ "group": 2 }))
            .into_input(Some(existing()), Mode::Partial)
            .unwrap();
        assert_eq!(moved.group, GroupId::new(2));
        assert_eq!(moved.category, None);

        let moved_with_category = payload(json!({ "group": 2, "category": 20 }))
            .into_input(Some(existing()), Mode::Partial)
            .unwrap();
        assert_eq!(moved_with_category.category, Some(CategoryId::new(20)));

        let same_group = payload(json!({ "group": 1 }))
            .into_input(Some(existing()), Mode::Partial)
            .unwrap();
        assert_eq!(same_group.category, Some(CategoryId::new(10)));
    }

    #[test]
    fn test_put_requires_fields_even_for_existing_products() {
        let errors = validation_errors(
            payload(json!({ "name": "Y" })).into_input(Some(existing()), Mode::Full),
        );
        assert!(errors.get("group").is_some());
        assert!(errors.get("capacity").is_some());
        assert!(errors.get("name").is_none());
    }

    #[test]
    fn test_stores_are_sorted_and_deduplicated() {
        let input = payload(json!({ "stores": [5, 2, 5] }))
            .into_input(Some(existing()), Mode::Partial)
            .unwrap();
        assert_eq!(input.stores, vec![StoreId::new(2), StoreId::new(5)]);
    }

    #[test]
    fn test_filter_parsing() {
        let query = ProductQuery {
            group: Some("4".to_string()),
            is_available: Some("false".to_string()),
            brand: Some(String::new()),
            ..ProductQuery::default()
        };
        let filter = query.filter().unwrap();
        assert_eq!(filter.group, Some(GroupId::new(4)));
        assert_eq!(filter.is_available, Some(false));
        assert_eq!(filter.brand, None);

        let bad = ProductQuery {
            store: Some("abc".to_string()),
            is_favourite: Some("maybe".to_string()),
            ..ProductQuery::default()
        };
        let Err(AppError::Validation(errors)) = bad.filter() else {
            panic!("expected validation errors");
        };
        assert!(errors.get("store").is_some());
        assert!(errors.get("is_favourite").is_some());
    }
}

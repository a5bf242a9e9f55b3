//! Catalog domain types.
//!
//! Every type here belongs to exactly one account. The owner is never part of
//! the serialized form: it is implied by the token that fetched it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use cosmetics_core::{BrandId, CategoryId, GroupId, PriceTier, ProductId, StoreId, UnitTier};

/// A cosmetic brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
}

/// A place products can be bought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
}

/// A sub-grouping of products inside one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub group: GroupId,
}

/// A top-level grouping with its categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    /// Ordered by name descending, then ID.
    pub categories: Vec<Category>,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: Option<BrandId>,
    pub group: GroupId,
    /// `None` only after the category it pointed at was deleted.
    pub category: Option<CategoryId>,
    pub price: PriceTier,
    pub ingredients: String,
    pub capacity: Decimal,
    pub unit: UnitTier,
    /// Sorted ascending.
    pub stores: Vec<StoreId>,
    pub is_available: bool,
    pub is_favourite: bool,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating or fully replacing a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub name: String,
    pub brand: Option<BrandId>,
    pub group: GroupId,
    /// `None` resolves to the group's fallback category on save.
    pub category: Option<CategoryId>,
    pub price: PriceTier,
    pub ingredients: String,
    pub capacity: Decimal,
    pub unit: UnitTier,
    pub stores: Vec<StoreId>,
    pub is_available: bool,
    pub is_favourite: bool,
    pub image: Option<String>,
}

impl From<Product> for ProductInput {
    fn from(product: Product) -> Self {
        Self {
            name: product.name,
            brand: product.brand,
            group: product.group,
            category: product.category,
            price: product.price,
            ingredients: product.ingredients,
            capacity: product.capacity,
            unit: product.unit,
            stores: product.stores,
            is_available: product.is_available,
            is_favourite: product.is_favourite,
            image: product.image,
        }
    }
}

/// Optional equality filters for listing products.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub group: Option<GroupId>,
    pub category: Option<CategoryId>,
    pub brand: Option<BrandId>,
    pub store: Option<StoreId>,
    pub is_available: Option<bool>,
    pub is_favourite: Option<bool>,
}

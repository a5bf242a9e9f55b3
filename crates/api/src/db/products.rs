//! Product repository for database operations.
//!
//! Product writes run in a single transaction that checks every referenced
//! row belongs to the owner, resolves the category through a
//! [`CategoryFallback`] when none was given, and rewrites the store links.

use std::future::Future;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use cosmetics_core::{
    AccountId, BrandId, CategoryId, GroupId, PriceTier, ProductId, StoreId, UnitTier,
};

use super::categories::CategoryRepository;
use super::{RepositoryError, Window};
use crate::models::{Product, ProductFilter, ProductInput};

/// Picks the category of a product saved without one.
pub trait CategoryFallback: Sync {
    /// Return the category to use for a product in `group`.
    fn resolve(
        &self,
        conn: &mut PgConnection,
        owner: AccountId,
        group: GroupId,
    ) -> impl Future<Output = Result<CategoryId, RepositoryError>> + Send;
}

// =============================================================================
// Internal Row Types
// =============================================================================

const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.name, p.brand_id, p.group_id, p.category_id, p.price,
           p.ingredients, p.capacity, p.unit, p.is_available, p.is_favourite,
           p.image, p.created_at, p.updated_at,
           ARRAY(
               SELECT ps.store_id FROM catalog.product_store ps
               WHERE ps.product_id = p.id
               ORDER BY ps.store_id
           ) AS store_ids
    FROM catalog.product p
";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    brand_id: Option<i32>,
    group_id: i32,
    category_id: Option<i32>,
    price: PriceTier,
    ingredients: String,
    capacity: Decimal,
    unit: UnitTier,
    is_available: bool,
    is_favourite: bool,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    store_ids: Vec<i32>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            brand: row.brand_id.map(BrandId::new),
            group: GroupId::new(row.group_id),
            category: row.category_id.map(CategoryId::new),
            price: row.price,
            ingredients: row.ingredients,
            capacity: row.capacity,
            unit: row.unit,
            stores: row.store_ids.into_iter().map(StoreId::new).collect(),
            is_available: row.is_available,
            is_favourite: row.is_favourite,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn does_not_exist(field: &'static str, id: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::invalid(field, format!("Invalid pk \"{id}\" - object does not exist."))
}

/// Owner scope plus the optional equality filters, bound as `$1..=$7`.
/// A `NULL` filter parameter matches every row.
const PRODUCT_FILTER: &str = r"
    WHERE p.account_id = $1
        AND ($2::int IS NULL OR p.group_id = $2)
        AND ($3::int IS NULL OR p.category_id = $3)
        AND ($4::int IS NULL OR p.brand_id = $4)
        AND ($5::int IS NULL OR EXISTS (
            SELECT 1 FROM catalog.product_store ps
            WHERE ps.product_id = p.id AND ps.store_id = $5
        ))
        AND ($6::boolean IS NULL OR p.is_available = $6)
        AND ($7::boolean IS NULL OR p.is_favourite = $7)
";

fn count_sql() -> String {
    format!("SELECT COUNT(*) FROM catalog.product p {PRODUCT_FILTER}")
}

fn list_sql() -> String {
    format!("{PRODUCT_SELECT} {PRODUCT_FILTER} ORDER BY p.name DESC, p.id ASC LIMIT $8 OFFSET $9")
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Count an account's products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(
        &self,
        owner: AccountId,
        filter: &ProductFilter,
    ) -> Result<i64, RepositoryError> {
        let sql = count_sql();
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(owner)
            .bind(filter.group)
            .bind(filter.category)
            .bind(filter.brand)
            .bind(filter.store)
            .bind(filter.is_available)
            .bind(filter.is_favourite)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// List one page of an account's products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        owner: AccountId,
        filter: &ProductFilter,
        window: Window,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = list_sql();
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(owner)
            .bind(filter.group)
            .bind(filter.category)
            .bind(filter.brand)
            .bind(filter.store)
            .bind(filter.is_available)
            .bind(filter.is_favourite)
            .bind(window.limit)
            .bind(window.offset)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        owner: AccountId,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, owner, id).await
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if a referenced brand, group,
    /// category, or store is not owned by `owner`, or the category is not in
    /// the product's group.
    /// Returns any error produced by `fallback`.
    pub async fn create<F: CategoryFallback>(
        &self,
        owner: AccountId,
        input: &ProductInput,
        fallback: &F,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        check_references(&mut tx, owner, input).await?;
        let category = match input.category {
            Some(category) => category,
            None => fallback.resolve(&mut tx, owner, input.group).await?,
        };

        let id = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO catalog.product (
                account_id, name, brand_id, group_id, category_id, price,
                ingredients, capacity, unit, is_available, is_favourite, image
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            ",
        )
        .bind(owner)
        .bind(&input.name)
        .bind(input.brand)
        .bind(input.group)
        .bind(category)
        .bind(input.price)
        .bind(&input.ingredients)
        .bind(input.capacity)
        .bind(input.unit)
        .bind(input.is_available)
        .bind(input.is_favourite)
        .bind(&input.image)
        .fetch_one(&mut *tx)
        .await?;
        let id = ProductId::new(id);

        replace_stores(&mut tx, id, &input.stores).await?;

        let product = fetch(&mut tx, owner, id)
            .await?
            .ok_or_else(|| RepositoryError::DataCorruption(format!("product {id} vanished")))?;

        tx.commit().await?;

        Ok(product)
    }

    /// Replace every field of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not belong to `owner`.
    /// Returns `RepositoryError::Invalid` for foreign or mismatched references,
    /// as for [`create`](Self::create).
    pub async fn update<F: CategoryFallback>(
        &self,
        owner: AccountId,
        id: ProductId,
        input: &ProductInput,
        fallback: &F,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM catalog.product WHERE id = $1 AND account_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Err(RepositoryError::NotFound);
        }

        check_references(&mut tx, owner, input).await?;
        let category = match input.category {
            Some(category) => category,
            None => fallback.resolve(&mut tx, owner, input.group).await?,
        };

        sqlx::query(
            r"
            UPDATE catalog.product SET
                name = $3, brand_id = $4, group_id = $5, category_id = $6,
                price = $7, ingredients = $8, capacity = $9, unit = $10,
                is_available = $11, is_favourite = $12, image = $13,
                updated_at = NOW()
            WHERE id = $1 AND account_id = $2
            ",
        )
        .bind(id)
        .bind(owner)
        .bind(&input.name)
        .bind(input.brand)
        .bind(input.group)
        .bind(category)
        .bind(input.price)
        .bind(&input.ingredients)
        .bind(input.capacity)
        .bind(input.unit)
        .bind(input.is_available)
        .bind(input.is_favourite)
        .bind(&input.image)
        .execute(&mut *tx)
        .await?;

        replace_stores(&mut tx, id, &input.stores).await?;

        let product = fetch(&mut tx, owner, id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;

        Ok(product)
    }

    /// Delete a product and its store links.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn delete(&self, owner: AccountId, id: ProductId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            DELETE FROM catalog.product_store ps
            USING catalog.product p
            WHERE ps.product_id = p.id AND p.id = $1 AND p.account_id = $2
            ",
        )
        .bind(id)
        .bind(owner)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM catalog.product WHERE id = $1 AND account_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

async fn fetch(
    conn: &mut PgConnection,
    owner: AccountId,
    id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "{PRODUCT_SELECT} WHERE p.id = $1 AND p.account_id = $2"
    ))
    .bind(id)
    .bind(owner)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(Into::into))
}

async fn check_references(
    conn: &mut PgConnection,
    owner: AccountId,
    input: &ProductInput,
) -> Result<(), RepositoryError> {
    if let Some(brand) = input.brand {
        let owned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM catalog.brand WHERE id = $1 AND account_id = $2)",
        )
        .bind(brand)
        .bind(owner)
        .fetch_one(&mut *conn)
        .await?;
        if !owned {
            return Err(does_not_exist("brand", brand));
        }
    }

    let group_owned = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM catalog.product_group WHERE id = $1 AND account_id = $2)",
    )
    .bind(input.group)
    .bind(owner)
    .fetch_one(&mut *conn)
    .await?;
    if !group_owned {
        return Err(does_not_exist("group", input.group));
    }

    if let Some(category) = input.category {
        match CategoryRepository::group_of(conn, owner, category).await? {
            None => return Err(does_not_exist("category", category)),
            Some(group) if group != input.group => {
                return Err(RepositoryError::invalid(
                    "category",
                    "Category does not belong to the selected group.",
                ));
            }
            Some(_) => {}
        }
    }

    if !input.stores.is_empty() {
        let ids: Vec<i32> = input.stores.iter().map(StoreId::as_i32).collect();
        let owned = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM catalog.store WHERE account_id = $1 AND id = ANY($2)",
        )
        .bind(owner)
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await?;

        if let Some(missing) = ids.iter().find(|id| !owned.contains(id)) {
            return Err(does_not_exist("stores", missing));
        }
    }

    Ok(())
}

async fn replace_stores(
    conn: &mut PgConnection,
    id: ProductId,
    stores: &[StoreId],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM catalog.product_store WHERE product_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if stores.is_empty() {
        return Ok(());
    }

    let ids: Vec<i32> = stores.iter().map(StoreId::as_i32).collect();
    sqlx::query(
        r"
        INSERT INTO catalog.product_store (product_id, store_id)
        SELECT $1, store_id FROM UNNEST($2::INTEGER[]) AS t(store_id)
        ON CONFLICT DO NOTHING
        ",
    )
    .bind(id)
    .bind(&ids)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

//! Brand CRUD handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};

use cosmetics_core::BrandId;

use super::extract::{ApiJson, ApiPath, ApiQuery, NamePayload, PageQuery, Paginated};
use super::method_not_allowed;
use crate::db::BrandRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Brand;
use crate::state::AppState;

/// Build the brands router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/brands",
            get(list).post(create).fallback(method_not_allowed),
        )
        .route(
            "/api/brands/{id}",
            get(show)
                .put(replace)
                .patch(update)
                .delete(destroy)
                .fallback(method_not_allowed),
        )
}

/// GET /api/brands
pub async fn list(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Paginated<Brand>>> {
    let page = query.resolve(state.config().default_page_size)?;
    let brands = BrandRepository::new(state.pool());

    let count = brands.count(account.id).await?;
    page.ensure_exists(count)?;
    let results = brands.list(account.id, page.window()).await?;

    Ok(Json(page.wrap(count, results)))
}

/// POST /api/brands
pub async fn create(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NamePayload>,
) -> Result<(StatusCode, Json<Brand>)> {
    let name = payload.require_name()?;
    let brand = BrandRepository::new(state.pool())
        .create(account.id, &name)
        .await?;

    tracing::info!(account_id = %account.id, brand_id = %brand.id, "Brand created");

    Ok((StatusCode::CREATED, Json(brand)))
}

/// GET /api/brands/{id}
pub async fn show(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<BrandId>,
) -> Result<Json<Brand>> {
    BrandRepository::new(state.pool())
        .get(account.id, id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

/// PUT /api/brands/{id}
pub async fn replace(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<BrandId>,
    ApiJson(payload): ApiJson<NamePayload>,
) -> Result<Json<Brand>> {
    let brands = BrandRepository::new(state.pool());
    if brands.get(account.id, id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let name = payload.require_name()?;
    Ok(Json(brands.update(account.id, id, &name).await?))
}

/// PATCH /api/brands/{id}
pub async fn update(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<BrandId>,
    ApiJson(payload): ApiJson<NamePayload>,
) -> Result<Json<Brand>> {
    let brands = BrandRepository::new(state.pool());
    let brand = brands.get(account.id, id).await?.ok_or(AppError::NotFound)?;

    match payload.optional_name()? {
        Some(name) => Ok(Json(brands.update(account.id, id, &name).await?)),
        None => Ok(Json(brand)),
    }
}

/// DELETE /api/brands/{id}
pub async fn destroy(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<BrandId>,
) -> Result<StatusCode> {
    if !BrandRepository::new(state.pool()).delete(account.id, id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(account_id = %account.id, brand_id = %id, "Brand deleted");

    Ok(StatusCode::NO_CONTENT)
}

//! Store CRUD handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};

use cosmetics_core::StoreId;

use super::extract::{ApiJson, ApiPath, ApiQuery, NamePayload, PageQuery, Paginated};
use super::method_not_allowed;
use crate::db::StoreRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Store;
use crate::state::AppState;

/// Build the stores router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/stores",
            get(list).post(create).fallback(method_not_allowed),
        )
        .route(
            "/api/stores/{id}",
            get(show)
                .put(replace)
                .patch(update)
                .delete(destroy)
                .fallback(method_not_allowed),
        )
}

/// GET /api/stores
pub async fn list(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Paginated<Store>>> {
    let page = query.resolve(state.config().default_page_size)?;
    let stores = StoreRepository::new(state.pool());

    let count = stores.count(account.id).await?;
    page.ensure_exists(count)?;
    let results = stores.list(account.id, page.window()).await?;

    Ok(Json(page.wrap(count, results)))
}

/// POST /api/stores
pub async fn create(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NamePayload>,
) -> Result<(StatusCode, Json<Store>)> {
    let name = payload.require_name()?;
    let store = StoreRepository::new(state.pool())
        .create(account.id, &name)
        .await?;

    tracing::info!(account_id = %account.id, store_id = %store.id, "Store created");

    Ok((StatusCode::CREATED, Json(store)))
}

/// GET /api/stores/{id}
pub async fn show(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<StoreId>,
) -> Result<Json<Store>> {
    StoreRepository::new(state.pool())
        .get(account.id, id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

/// PUT /api/stores/{id}
pub async fn replace(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<StoreId>,
    ApiJson(payload): ApiJson<NamePayload>,
) -> Result<Json<Store>> {
    let stores = StoreRepository::new(state.pool());
    if stores.get(account.id, id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let name = payload.require_name()?;
    Ok(Json(stores.update(account.id, id, &name).await?))
}

/// PATCH /api/stores/{id}
pub async fn update(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<StoreId>,
    ApiJson(payload): ApiJson<NamePayload>,
) -> Result<Json<Store>> {
    let stores = StoreRepository::new(state.pool());
    let store = stores.get(account.id, id).await?.ok_or(AppError::NotFound)?;

    match payload.optional_name()? {
        Some(name) => Ok(Json(stores.update(account.id, id, &name).await?)),
        None => Ok(Json(store)),
    }
}

/// DELETE /api/stores/{id}
pub async fn destroy(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<StoreId>,
) -> Result<StatusCode> {
    if !StoreRepository::new(state.pool()).delete(account.id, id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(account_id = %account.id, store_id = %id, "Store deleted");

    Ok(StatusCode::NO_CONTENT)
}

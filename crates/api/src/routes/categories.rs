//! Category handlers, scoped under the group they belong to.
//!
//! The group in the path is checked first: a group the caller does not own
//! answers 404 before the body is looked at. `/api/categories` exists only to
//! answer 405, since a category cannot be addressed without its group.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{any, get},
};

use cosmetics_core::{AccountId, CategoryId, GroupId};

use super::extract::{ApiJson, ApiPath, ApiQuery, NamePayload, PageQuery, Paginated};
use super::method_not_allowed;
use crate::db::{CategoryRepository, GroupRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Category;
use crate::state::AppState;

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/groups/{group_id}/categories",
            get(list).post(create).fallback(method_not_allowed),
        )
        .route(
            "/api/groups/{group_id}/categories/{id}",
            get(show)
                .put(replace)
                .patch(update)
                .delete(destroy)
                .fallback(method_not_allowed),
        )
        .route("/api/categories", any(method_not_allowed))
}

async fn ensure_group(state: &AppState, owner: AccountId, group: GroupId) -> Result<()> {
    if GroupRepository::new(state.pool()).exists(owner, group).await? {
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}

/// GET /api/groups/{group_id}/categories
pub async fn list(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiPath(group): ApiPath<GroupId>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Paginated<Category>>> {
    ensure_group(&state, account.id, group).await?;

    let page = query.resolve(state.config().default_page_size)?;
    let categories = CategoryRepository::new(state.pool());

    let count = categories.count(account.id, group).await?;
    page.ensure_exists(count)?;
    let results = categories.list(account.id, group, page.window()).await?;

    Ok(Json(page.wrap(count, results)))
}

/// POST /api/groups/{group_id}/categories
pub async fn create(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiPath(group): ApiPath<GroupId>,
    ApiJson(payload): ApiJson<NamePayload>,
) -> Result<(StatusCode, Json<Category>)> {
    ensure_group(&state, account.id, group).await?;

    let name = payload.require_name()?;
    let category = CategoryRepository::new(state.pool())
        .create(account.id, group, &name)
        .await?;

    tracing::info!(
        account_id = %account.id,
        group_id = %group,
        category_id = %category.id,
        "Category created"
    );

    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /api/groups/{group_id}/categories/{id}
pub async fn show(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiPath((group, id)): ApiPath<(GroupId, CategoryId)>,
) -> Result<Json<Category>> {
    CategoryRepository::new(state.pool())
        .get(account.id, group, id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

/// PUT /api/groups/{group_id}/categories/{id}
pub async fn replace(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiPath((group, id)): ApiPath<(GroupId, CategoryId)>,
    ApiJson(payload): ApiJson<NamePayload>,
) -> Result<Json<Category>> {
    let categories = CategoryRepository::new(state.pool());
    if categories.get(account.id, group, id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let name = payload.require_name()?;
    Ok(Json(categories.update(account.id, group, id, &name).await?))
}

/// PATCH /api/groups/{group_id}/categories/{id}
pub async fn update(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiPath((group, id)): ApiPath<(GroupId, CategoryId)>,
    ApiJson(payload): ApiJson<NamePayload>,
) -> Result<Json<Category>> {
    let categories = CategoryRepository::new(state.pool());
    let category = categories
        .get(account.id, group, id)
        .await?
        .ok_or(AppError::NotFound)?;

    match payload.optional_name()? {
        Some(name) => Ok(Json(categories.update(account.id, group, id, &name).await?)),
        None => Ok(Json(category)),
    }
}

/// DELETE /api/groups/{group_id}/categories/{id}
pub async fn destroy(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiPath((group, id)): ApiPath<(GroupId, CategoryId)>,
) -> Result<StatusCode> {
    if !CategoryRepository::new(state.pool())
        .delete(account.id, group, id)
        .await?
    {
        return Err(AppError::NotFound);
    }

    tracing::info!(
        account_id = %account.id,
        group_id = %group,
        category_id = %id,
        "Category deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

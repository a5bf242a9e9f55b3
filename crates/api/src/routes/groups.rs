//! Read-only group handlers.
//!
//! Groups are created for an account when it registers and cannot be
//! changed over the API; every write method answers 405.

use axum::{Json, Router, extract::State, routing::get};

use cosmetics_core::GroupId;

use super::extract::{ApiPath, ApiQuery, PageQuery, Paginated};
use super::method_not_allowed;
use crate::db::GroupRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Group;
use crate::state::AppState;

/// Build the groups router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/groups", get(list).fallback(method_not_allowed))
        .route("/api/groups/{id}", get(show).fallback(method_not_allowed))
}

/// GET /api/groups
pub async fn list(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Paginated<Group>>> {
    let page = query.resolve(state.config().default_page_size)?;
    let groups = GroupRepository::new(state.pool());

    let count = groups.count(account.id).await?;
    page.ensure_exists(count)?;
    let results = groups.list(account.id, page.window()).await?;

    Ok(Json(page.wrap(count, results)))
}

/// GET /api/groups/{id}
pub async fn show(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<GroupId>,
) -> Result<Json<Group>> {
    GroupRepository::new(state.pool())
        .get(account.id, id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

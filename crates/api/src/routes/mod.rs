//! HTTP route handlers for the catalog API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                   - Liveness
//! GET  /health/ready                             - Readiness (database ping)
//!
//! # Accounts (no auth)
//! POST /api/user/register                        - Register, seeds default groups
//! POST /api/user/token                           - Obtain a bearer token
//!
//! # Catalog (bearer token required)
//! GET  POST              /api/brands
//! GET  PUT PATCH DELETE  /api/brands/{id}
//! GET  POST              /api/stores
//! GET  PUT PATCH DELETE  /api/stores/{id}
//! GET                    /api/groups             - With nested categories
//! GET                    /api/groups/{id}
//! GET  POST              /api/groups/{group_id}/categories
//! GET  PUT PATCH DELETE  /api/groups/{group_id}/categories/{id}
//! GET  POST              /api/products           - Filters: group, category, brand,
//!                                                  store, is_available, is_favourite
//! GET  PUT PATCH DELETE  /api/products/{id}
//! ```
//!
//! Any other method on these paths, and any method on `/api/categories`,
//! answers 405.

pub mod brands;
pub mod categories;
pub mod extract;
pub mod groups;
pub mod products;
pub mod stores;
pub mod users;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::error::AppError;
use crate::state::AppState;

/// Handler for methods a route does not accept.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Create the account routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/user/register",
            post(users::register).fallback(method_not_allowed),
        )
        .route(
            "/api/user/token",
            post(users::token).fallback(method_not_allowed),
        )
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(user_routes())
        .merge(brands::router())
        .merge(stores::router())
        .merge(groups::router())
        .merge(categories::router())
        .merge(products::router())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

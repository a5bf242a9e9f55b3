//! HTTP middleware stack for the catalog API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request span with `request_id` and `account_id` fields)
//! 3. Request ID (add unique ID to each request)
//!
//! Authentication is not a layer: handlers that need a caller take the
//! [`RequireAuth`] extractor.

pub mod auth;
pub mod request_id;

pub use auth::RequireAuth;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};

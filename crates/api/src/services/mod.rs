//! Business logic services for the catalog API.
//!
//! # Services
//!
//! - `auth` - Registration, login, and bearer token resolution
//! - `bootstrap` - Default groups and categories of a new account
//! - `fallback` - Category assigned to products saved without one

pub mod auth;
pub mod bootstrap;
pub mod fallback;

pub use auth::{AuthError, AuthService};
pub use bootstrap::DefaultCatalog;
pub use fallback::OtherCategory;

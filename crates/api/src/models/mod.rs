//! Domain models for the catalog API.
//!
//! Catalog types double as the JSON representation returned to clients;
//! [`account::Account`] does not, because it must never be echoed whole.

pub mod account;
pub mod catalog;

pub use account::{Account, CurrentAccount, NewAccount};
pub use catalog::{
    Brand, Category, Group, Product, ProductFilter, ProductInput, Store,
};

//! Request extraction helpers shared by the API handlers.
//!
//! - [`ApiJson`], [`ApiPath`], and [`ApiQuery`] turn extractor rejections
//!   into JSON errors.
//! - [`PageQuery`] / [`Page`] / [`Paginated`] implement page-number pagination.
//! - [`NamePayload`] is the body of every entity that is just a name.

use axum::extract::{FromRequest, FromRequestParts};
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::MAX_PAGE_SIZE;
use crate::db::Window;
use crate::error::{AppError, FieldErrors};

pub(crate) const REQUIRED: &str = "This field is required.";
pub(crate) const BLANK: &str = "This field may not be blank.";

/// JSON body extractor whose rejection is an [`AppError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path extractor; an unparseable ID is reported as not found.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Query string extractor whose rejection is an [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Deserialize a field that distinguishes "absent" from "explicitly null".
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// absent is `None`, `null` is `Some(None)`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Validate a required name field, recording problems in `errors`.
///
/// Returns the trimmed name when it is valid.
pub(crate) fn required_name(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max_chars: usize,
) -> Option<String> {
    let Some(value) = value else {
        errors.add(field, REQUIRED);
        return None;
    };
    checked_name(errors, field, value, max_chars)
}

/// Validate a name that is present, recording problems in `errors`.
pub(crate) fn checked_name(
    errors: &mut FieldErrors,
    field: &str,
    value: &str,
    max_chars: usize,
) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    if trimmed.chars().count() > max_chars {
        errors.add(
            field,
            format!("Ensure this field has no more than {max_chars} characters."),
        );
        return None;
    }
    Some(trimmed.to_owned())
}

// =============================================================================
// Named entities
// =============================================================================

/// Longest name of a brand, store, group, or category.
pub(crate) const MAX_NAME_CHARS: usize = 100;

/// Body of brand, store, and category writes.
#[derive(Debug, Default, Deserialize)]
pub struct NamePayload {
    pub name: Option<String>,
}

impl NamePayload {
    /// Validate for create or full update.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the name is missing, blank, or too long.
    pub fn require_name(&self) -> Result<String, AppError> {
        let mut errors = FieldErrors::new();
        let name = required_name(&mut errors, "name", self.name.as_deref(), MAX_NAME_CHARS);
        match name {
            Some(name) => Ok(name),
            None => Err(AppError::Validation(errors)),
        }
    }

    /// Validate for a partial update: the name may be left out.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the name is present but blank or too long.
    pub fn optional_name(&self) -> Result<Option<String>, AppError> {
        match self.name.as_deref() {
            None => Ok(None),
            Some(_) => self.require_name().map(Some),
        }
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// `page` and `page_size` query parameters.
///
/// Kept as strings so a malformed value becomes a 404 or the default size
/// instead of a query rejection.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl PageQuery {
    /// Resolve against the configured default page size.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if `page` is not a positive integer.
    pub fn resolve(&self, default_size: u32) -> Result<Page, AppError> {
        let number = match self.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(AppError::NotFound)?,
        };

        let size = self
            .page_size
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|size| *size > 0)
            .map_or(default_size, |size| size.min(MAX_PAGE_SIZE));

        Ok(Page { number, size })
    }
}

/// A resolved page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub number: u32,
    /// Rows per page.
    pub size: u32,
}

impl Page {
    /// Number of pages needed for `count` rows; an empty list still has one.
    #[must_use]
    pub fn last_page(&self, count: i64) -> u32 {
        let count = u64::try_from(count).unwrap_or(0);
        let pages = count.div_ceil(u64::from(self.size)).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Fail when this page lies beyond the last one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if `number` is past the last page.
    pub fn ensure_exists(&self, count: i64) -> Result<(), AppError> {
        if self.number > self.last_page(count) {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    /// Rows to fetch for this page.
    #[must_use]
    pub fn window(&self) -> Window {
        Window {
            limit: i64::from(self.size),
            offset: i64::from(self.number - 1) * i64::from(self.size),
        }
    }

    /// Wrap one page of results.
    #[must_use]
    pub fn wrap<T>(&self, count: i64, results: Vec<T>) -> Paginated<T> {
        let last = self.last_page(count);
        Paginated {
            count,
            next: (self.number < last).then(|| self.number + 1),
            previous: (self.number > 1).then(|| self.number - 1),
            results,
        }
    }
}

/// Paginated list response body.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub count: i64,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<T>,
}

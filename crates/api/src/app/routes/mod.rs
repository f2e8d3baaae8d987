pub mod accounts;
pub mod admin;
pub mod billing;
pub mod categories;
pub mod products;
pub mod sourcing;

use std::str::FromStr;

use tradepost_core::DomainError;

use super::errors::ApiError;

/// Parse a path segment into a typed id, mapping failures into the standard
/// error envelope instead of axum's default rejection.
fn parse_id<T: FromStr<Err = DomainError>>(raw: &str) -> Result<T, ApiError> {
    raw.parse::<T>().map_err(ApiError::from)
}

//! `tradepost-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod country;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod version;

pub use country::CountryCode;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, PlanId, ProductId, RequestId, UserId};
pub use money::Price;
pub use version::ExpectedVersion;

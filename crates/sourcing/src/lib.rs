//! `tradepost-sourcing` — buyer sourcing requests.
//!
//! Requests share the product moderation gate and additionally expire on a
//! deadline: expiry is time-derived at read, never an admin action.

pub mod request;

pub use request::{NewRequest, RequestChanges, RequestEvent, RequestStatus, SourcingRequest};

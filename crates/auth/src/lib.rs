//! `tradepost-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod actor;
pub mod authorize;
pub mod claims;
pub mod roles;

pub use actor::Actor;
pub use authorize::{AuthzError, require_admin, require_owner};
pub use claims::{
    Hs256JwtValidator, JwtClaims, JwtValidator, TokenValidationError, validate_claims,
};
pub use roles::Role;

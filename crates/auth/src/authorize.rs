use thiserror::Error;

use tradepost_core::{DomainError, UserId};

use crate::Actor;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("admin role required")]
    NotAdmin,

    #[error("only the owner may perform this action")]
    NotOwner,
}

impl From<AuthzError> for DomainError {
    fn from(_: AuthzError) -> Self {
        DomainError::Unauthorized
    }
}

/// Require the actor to hold the admin role.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn require_admin(actor: &Actor) -> Result<(), AuthzError> {
    if actor.role.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::NotAdmin)
    }
}

/// Require the actor to be the owner of the entity being mutated.
///
/// Admins are *not* implicitly owners: admin-originated transitions go
/// through their own role check, owner transitions through this one.
pub fn require_owner(actor: &Actor, owner: UserId) -> Result<(), AuthzError> {
    if actor.id == owner {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}

use tradepost_auth::{Actor, Role};
use tradepost_core::UserId;

/// Authenticated actor for a request.
///
/// This is immutable and must be present for all domain routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    actor: Actor,
}

impl ActorContext {
    pub fn new(actor: Actor) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn user_id(&self) -> UserId {
        self.actor.id
    }

    pub fn role(&self) -> Role {
        self.actor.role
    }
}

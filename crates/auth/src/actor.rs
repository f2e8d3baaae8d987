use serde::{Deserialize, Serialize};

use tradepost_core::UserId;

use crate::Role;

/// The authenticated identity performing an action.
///
/// Construction is decoupled from transport: the API layer derives an actor
/// from validated token claims before touching any domain operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn admin(id: UserId) -> Self {
        Self::new(id, Role::Admin)
    }
}

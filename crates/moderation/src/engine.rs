//! Admin-originated status transitions.
//!
//! Decision logic is pure: given the current status, an action, and the
//! acting identity, either produce the new status plus the notification
//! effect, or fail without touching anything.

use serde::{Deserialize, Serialize};

use tradepost_auth::{Actor, require_admin};
use tradepost_core::{DomainError, DomainResult};

use crate::status::ModerationStatus;

/// An admin decision on a pending entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModerationAction {
    Approve,
    Reject { reason: String },
}

/// Side effect owed to the entity's owner after a successful transition.
///
/// The caller turns this into a notification; the reason is carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModerationEffect {
    Approved,
    Rejected { reason: String },
}

/// Result of a successful transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub status: ModerationStatus,
    pub effect: ModerationEffect,
}

/// Validate and apply an admin moderation action.
///
/// - Only admins may approve/reject.
/// - Admin actions are only valid from `pending` (an entity is judged exactly
///   once per submission).
/// - Rejection requires a non-empty reason.
pub fn transition(
    current: ModerationStatus,
    action: &ModerationAction,
    actor: &Actor,
) -> DomainResult<Transition> {
    require_admin(actor)?;

    if !current.is_pending() {
        return Err(DomainError::invalid_state(format!(
            "moderation action only valid from pending (current: {current})"
        )));
    }

    match action {
        ModerationAction::Approve => Ok(Transition {
            status: ModerationStatus::Approved,
            effect: ModerationEffect::Approved,
        }),
        ModerationAction::Reject { reason } => {
            if reason.trim().is_empty() {
                return Err(DomainError::validation("rejection requires a reason"));
            }
            Ok(Transition {
                status: ModerationStatus::Rejected,
                effect: ModerationEffect::Rejected {
                    reason: reason.clone(),
                },
            })
        }
    }
}

//! Owner-edit policy: which fields may change without forcing re-review.

use std::collections::BTreeSet;

use crate::status::ModerationStatus;

/// Per-entity-type allow-list of fields an owner may edit live.
///
/// Any edit touching a field outside the list resets the entity to
/// `pending`, discarding a prior approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPolicy {
    allowed: BTreeSet<&'static str>,
}

impl EditPolicy {
    pub fn new(allowed: &[&'static str]) -> Self {
        Self {
            allowed: allowed.iter().copied().collect(),
        }
    }

    pub fn allows(&self, field: &str) -> bool {
        self.allowed.contains(field)
    }

    pub fn allowed_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.allowed.iter().copied()
    }
}

/// Status after an owner edit.
///
/// Unchanged iff every changed field is allow-listed; otherwise `pending`
/// regardless of the previous status. An empty change set is a no-op.
pub fn status_after_edit<'a, I>(
    current: ModerationStatus,
    changed_fields: I,
    policy: &EditPolicy,
) -> ModerationStatus
where
    I: IntoIterator<Item = &'a str>,
{
    let forces_review = changed_fields.into_iter().any(|f| !policy.allows(f));
    if forces_review {
        ModerationStatus::Pending
    } else {
        current
    }
}

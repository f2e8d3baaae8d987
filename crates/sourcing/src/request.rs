use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradepost_auth::{Actor, require_owner};
use tradepost_core::{CategoryId, DomainError, DomainResult, Entity, Price, RequestId, UserId};
use tradepost_events::Event;
use tradepost_moderation::{
    EditPolicy, ModerationAction, ModerationEffect, ModerationStatus, status_after_edit, transition,
};

/// Externally visible request status, with expiry folded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

impl core::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Expired => "expired",
        })
    }
}

/// A sourcing request owned by a buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcingRequest {
    id: RequestId,
    buyer_id: UserId,
    category_id: CategoryId,
    title: String,
    details: String,
    quantity: u64,
    target_price: Price,
    expires_at: DateTime<Utc>,
    status: ModerationStatus,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Input for a new sourcing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequest {
    pub id: RequestId,
    pub buyer_id: UserId,
    pub category_id: CategoryId,
    pub title: String,
    pub details: String,
    pub quantity: u64,
    pub target_price: Price,
    pub expires_at: DateTime<Utc>,
}

/// Buyer-editable fields. `None` = leave untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestChanges {
    pub title: Option<String>,
    pub details: Option<String>,
    pub category_id: Option<CategoryId>,
    pub quantity: Option<u64>,
    pub target_price: Option<Price>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Domain events emitted by request operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestEvent {
    Submitted {
        request_id: RequestId,
        buyer_id: UserId,
        occurred_at: DateTime<Utc>,
    },
    Approved {
        request_id: RequestId,
        buyer_id: UserId,
        occurred_at: DateTime<Utc>,
    },
    Rejected {
        request_id: RequestId,
        buyer_id: UserId,
        reason: String,
        occurred_at: DateTime<Utc>,
    },
    ResubmittedForReview {
        request_id: RequestId,
        buyer_id: UserId,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for RequestEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RequestEvent::Submitted { .. } => "sourcing.request.submitted",
            RequestEvent::Approved { .. } => "sourcing.request.approved",
            RequestEvent::Rejected { .. } => "sourcing.request.rejected",
            RequestEvent::ResubmittedForReview { .. } => "sourcing.request.resubmitted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            RequestEvent::Submitted { occurred_at, .. }
            | RequestEvent::Approved { occurred_at, .. }
            | RequestEvent::Rejected { occurred_at, .. }
            | RequestEvent::ResubmittedForReview { occurred_at, .. } => *occurred_at,
        }
    }
}

impl Entity for SourcingRequest {
    type Id = RequestId;

    fn id(&self) -> &RequestId {
        &self.id
    }
}

impl SourcingRequest {
    /// Fields a buyer may tune without forcing re-review.
    pub fn edit_policy() -> EditPolicy {
        EditPolicy::new(&["quantity", "target_price"])
    }

    /// Validate and create a new request in `pending`.
    pub fn submit(input: NewRequest, now: DateTime<Utc>) -> DomainResult<(Self, RequestEvent)> {
        if input.title.trim().is_empty() {
            return Err(DomainError::validation("title cannot be empty"));
        }
        if input.quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if input.expires_at <= now {
            return Err(DomainError::validation("expiry must be in the future"));
        }

        let request = Self {
            id: input.id,
            buyer_id: input.buyer_id,
            category_id: input.category_id,
            title: input.title,
            details: input.details,
            quantity: input.quantity,
            target_price: input.target_price,
            expires_at: input.expires_at,
            status: ModerationStatus::Pending,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };

        let event = RequestEvent::Submitted {
            request_id: request.id,
            buyer_id: request.buyer_id,
            occurred_at: now,
        };

        Ok((request, event))
    }

    pub fn request_id(&self) -> RequestId {
        self.id
    }

    pub fn buyer_id(&self) -> UserId {
        self.buyer_id
    }

    pub fn category_id(&self) -> CategoryId {
        self.category_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn target_price(&self) -> &Price {
        &self.target_price
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Status with expiry folded in.
    ///
    /// Expiry masks `pending` and `approved`; `rejected` is terminal and
    /// never flips to `expired`.
    pub fn effective_status(&self, now: DateTime<Utc>) -> RequestStatus {
        match self.status {
            ModerationStatus::Rejected => RequestStatus::Rejected,
            _ if self.is_expired(now) => RequestStatus::Expired,
            ModerationStatus::Pending => RequestStatus::Pending,
            ModerationStatus::Approved => RequestStatus::Approved,
        }
    }

    /// Apply an admin moderation decision.
    ///
    /// Expired requests are closed to moderation.
    pub fn decide(
        &mut self,
        action: &ModerationAction,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> DomainResult<RequestEvent> {
        if self.is_expired(now) {
            return Err(DomainError::invalid_state("request has expired"));
        }

        let t = transition(self.status, action, actor)?;

        self.status = t.status;
        self.updated_at = now;

        Ok(match t.effect {
            ModerationEffect::Approved => {
                self.rejection_reason = None;
                RequestEvent::Approved {
                    request_id: self.id,
                    buyer_id: self.buyer_id,
                    occurred_at: now,
                }
            }
            ModerationEffect::Rejected { reason } => {
                self.rejection_reason = Some(reason.clone());
                RequestEvent::Rejected {
                    request_id: self.id,
                    buyer_id: self.buyer_id,
                    reason,
                    occurred_at: now,
                }
            }
        })
    }

    /// Apply a buyer edit.
    ///
    /// `quantity` and `target_price` may be tuned live; anything else resets
    /// the request to `pending` for re-review.
    pub fn apply_edit(
        &mut self,
        actor: &Actor,
        changes: RequestChanges,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<RequestEvent>> {
        require_owner(actor, self.buyer_id)?;

        if let Some(title) = &changes.title {
            if title.trim().is_empty() {
                return Err(DomainError::validation("title cannot be empty"));
            }
        }
        if changes.quantity == Some(0) {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if let Some(expires_at) = changes.expires_at {
            if expires_at <= now {
                return Err(DomainError::validation("expiry must be in the future"));
            }
        }

        let changed = self.changed_fields(&changes);
        if changed.is_empty() {
            return Ok(None);
        }

        let next = status_after_edit(self.status, changed.iter().copied(), &Self::edit_policy());

        if let Some(v) = changes.title {
            self.title = v;
        }
        if let Some(v) = changes.details {
            self.details = v;
        }
        if let Some(v) = changes.category_id {
            self.category_id = v;
        }
        if let Some(v) = changes.quantity {
            self.quantity = v;
        }
        if let Some(v) = changes.target_price {
            self.target_price = v;
        }
        if let Some(v) = changes.expires_at {
            self.expires_at = v;
        }
        self.updated_at = now;

        let reset = next.is_pending() && !self.status.is_pending();
        self.status = next;

        if reset {
            self.rejection_reason = None;
            Ok(Some(RequestEvent::ResubmittedForReview {
                request_id: self.id,
                buyer_id: self.buyer_id,
                occurred_at: now,
            }))
        } else {
            Ok(None)
        }
    }

    fn changed_fields(&self, changes: &RequestChanges) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if changes.title.as_ref().is_some_and(|v| *v != self.title) {
            changed.push("title");
        }
        if changes.details.as_ref().is_some_and(|v| *v != self.details) {
            changed.push("details");
        }
        if changes.category_id.is_some_and(|v| v != self.category_id) {
            changed.push("category_id");
        }
        if changes.quantity.is_some_and(|v| v != self.quantity) {
            changed.push("quantity");
        }
        if changes
            .target_price
            .as_ref()
            .is_some_and(|v| *v != self.target_price)
        {
            changed.push("target_price");
        }
        if changes.expires_at.is_some_and(|v| v != self.expires_at) {
            changed.push("expires_at");
        }
        changed
    }
}

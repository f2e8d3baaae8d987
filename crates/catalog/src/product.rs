use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradepost_auth::{Actor, require_owner};
use tradepost_core::{CategoryId, DomainError, DomainResult, Entity, Price, ProductId, UserId};
use tradepost_events::Event;
use tradepost_moderation::{
    EditPolicy, ModerationAction, ModerationEffect, ModerationStatus, status_after_edit, transition,
};

/// A product listing owned by a seller.
///
/// Listings enter `pending` on submission, are judged exactly once per
/// submission by an admin, and return to `pending` whenever the seller edits
/// a field outside the live-editable allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    seller_id: UserId,
    category_id: CategoryId,
    name: String,
    description: String,
    price: Price,
    stock: u64,
    lead_time_days: u32,
    images: Vec<String>,
    specifications: BTreeMap<String, String>,
    status: ModerationStatus,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Input for a new listing submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub id: ProductId,
    pub seller_id: UserId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: u64,
    pub lead_time_days: u32,
    pub images: Vec<String>,
    pub specifications: BTreeMap<String, String>,
}

/// Seller-editable fields. `None` = leave untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub price: Option<Price>,
    pub stock: Option<u64>,
    pub lead_time_days: Option<u32>,
    pub images: Option<Vec<String>>,
    pub specifications: Option<BTreeMap<String, String>>,
}

/// Domain events emitted by listing operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductEvent {
    Submitted {
        product_id: ProductId,
        seller_id: UserId,
        occurred_at: DateTime<Utc>,
    },
    Approved {
        product_id: ProductId,
        seller_id: UserId,
        occurred_at: DateTime<Utc>,
    },
    Rejected {
        product_id: ProductId,
        seller_id: UserId,
        reason: String,
        occurred_at: DateTime<Utc>,
    },
    /// A non-allow-listed edit pushed the listing back into the pending queue.
    ResubmittedForReview {
        product_id: ProductId,
        seller_id: UserId,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::Submitted { .. } => "catalog.product.submitted",
            ProductEvent::Approved { .. } => "catalog.product.approved",
            ProductEvent::Rejected { .. } => "catalog.product.rejected",
            ProductEvent::ResubmittedForReview { .. } => "catalog.product.resubmitted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::Submitted { occurred_at, .. }
            | ProductEvent::Approved { occurred_at, .. }
            | ProductEvent::Rejected { occurred_at, .. }
            | ProductEvent::ResubmittedForReview { occurred_at, .. } => *occurred_at,
        }
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &ProductId {
        &self.id
    }
}

impl Product {
    /// Fields a seller may edit without forcing re-review.
    pub fn edit_policy() -> EditPolicy {
        EditPolicy::new(&["price", "stock", "lead_time_days"])
    }

    /// Validate and create a new listing in `pending`.
    pub fn submit(input: NewProduct, now: DateTime<Utc>) -> DomainResult<(Self, ProductEvent)> {
        if input.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        let product = Self {
            id: input.id,
            seller_id: input.seller_id,
            category_id: input.category_id,
            name: input.name,
            description: input.description,
            price: input.price,
            stock: input.stock,
            lead_time_days: input.lead_time_days,
            images: input.images,
            specifications: input.specifications,
            status: ModerationStatus::Pending,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };

        let event = ProductEvent::Submitted {
            product_id: product.id,
            seller_id: product.seller_id,
            occurred_at: now,
        };

        Ok((product, event))
    }

    pub fn product_id(&self) -> ProductId {
        self.id
    }

    pub fn seller_id(&self) -> UserId {
        self.seller_id
    }

    pub fn category_id(&self) -> CategoryId {
        self.category_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> &Price {
        &self.price
    }

    pub fn stock(&self) -> u64 {
        self.stock
    }

    pub fn lead_time_days(&self) -> u32 {
        self.lead_time_days
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn specifications(&self) -> &BTreeMap<String, String> {
        &self.specifications
    }

    pub fn status(&self) -> ModerationStatus {
        self.status
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    /// Whether the listing is visible to buyers.
    pub fn is_listed(&self) -> bool {
        self.status == ModerationStatus::Approved
    }

    /// Apply an admin moderation decision.
    pub fn decide(
        &mut self,
        action: &ModerationAction,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> DomainResult<ProductEvent> {
        let t = transition(self.status, action, actor)?;

        self.status = t.status;
        self.updated_at = now;

        Ok(match t.effect {
            ModerationEffect::Approved => {
                self.rejection_reason = None;
                ProductEvent::Approved {
                    product_id: self.id,
                    seller_id: self.seller_id,
                    occurred_at: now,
                }
            }
            ModerationEffect::Rejected { reason } => {
                self.rejection_reason = Some(reason.clone());
                ProductEvent::Rejected {
                    product_id: self.id,
                    seller_id: self.seller_id,
                    reason,
                    occurred_at: now,
                }
            }
        })
    }

    /// Apply a seller edit.
    ///
    /// Only fields that actually differ count as changed; an edit touching a
    /// non-allow-listed field resets the listing to `pending` and yields a
    /// re-review event.
    pub fn apply_edit(
        &mut self,
        actor: &Actor,
        changes: ProductChanges,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<ProductEvent>> {
        require_owner(actor, self.seller_id)?;

        if let Some(name) = &changes.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
        }

        let changed = self.changed_fields(&changes);
        if changed.is_empty() {
            return Ok(None);
        }

        let next = status_after_edit(self.status, changed.iter().copied(), &Self::edit_policy());

        if let Some(v) = changes.name {
            self.name = v;
        }
        if let Some(v) = changes.description {
            self.description = v;
        }
        if let Some(v) = changes.category_id {
            self.category_id = v;
        }
        if let Some(v) = changes.price {
            self.price = v;
        }
        if let Some(v) = changes.stock {
            self.stock = v;
        }
        if let Some(v) = changes.lead_time_days {
            self.lead_time_days = v;
        }
        if let Some(v) = changes.images {
            self.images = v;
        }
        if let Some(v) = changes.specifications {
            self.specifications = v;
        }
        self.updated_at = now;

        let reset = next.is_pending() && !self.status.is_pending();
        self.status = next;

        if reset {
            self.rejection_reason = None;
            Ok(Some(ProductEvent::ResubmittedForReview {
                product_id: self.id,
                seller_id: self.seller_id,
                occurred_at: now,
            }))
        } else {
            Ok(None)
        }
    }

    fn changed_fields(&self, changes: &ProductChanges) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if changes.name.as_ref().is_some_and(|v| *v != self.name) {
            changed.push("name");
        }
        if changes
            .description
            .as_ref()
            .is_some_and(|v| *v != self.description)
        {
            changed.push("description");
        }
        if changes
            .category_id
            .is_some_and(|v| v != self.category_id)
        {
            changed.push("category_id");
        }
        if changes.price.as_ref().is_some_and(|v| *v != self.price) {
            changed.push("price");
        }
        if changes.stock.is_some_and(|v| v != self.stock) {
            changed.push("stock");
        }
        if changes
            .lead_time_days
            .is_some_and(|v| v != self.lead_time_days)
        {
            changed.push("lead_time_days");
        }
        if changes.images.as_ref().is_some_and(|v| *v != self.images) {
            changed.push("images");
        }
        if changes
            .specifications
            .as_ref()
            .is_some_and(|v| *v != self.specifications)
        {
            changed.push("specifications");
        }
        changed
    }
}

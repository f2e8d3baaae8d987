//! Application services: load → decide → conditionally write → publish.
//!
//! Every mutation follows the same shape: read the document and its revision,
//! run the domain operation, write back at `ExpectedVersion::Exact(revision)`,
//! then publish the committed event to the bus. A concurrent writer surfaces
//! as a conflict, never as a lost update.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use tradepost_accounts::{NewUser, ProfileChanges, UserProfile, VerificationStatus, find_scoped_duplicate};
use tradepost_auth::{Actor, Role, require_admin};
use tradepost_billing::{
    PaymentGateway, PaymentOrder, PaymentReceipt, PlanChanges, PlanKind, SubscriptionPlan,
    can_create, resolve_plan,
};
use tradepost_catalog::{Category, CategoryTree, NewProduct, Product, ProductChanges};
use tradepost_core::{
    CategoryId, DomainError, DomainResult, ExpectedVersion, PlanId, ProductId, RequestId, UserId,
};
use tradepost_events::{Event, EventBus, EventEnvelope, InMemoryEventBus};
use tradepost_infra::EntityStore;
use tradepost_moderation::{ModerationAction, ModerationStatus};
use tradepost_sourcing::{NewRequest, RequestChanges, RequestStatus, SourcingRequest};

pub type SharedBus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;

/// Outcome of a subscription purchase attempt.
pub enum SubscribeOutcome {
    /// Free tier (or zero regional price): active immediately.
    Activated(UserProfile),
    /// Paid plan: an order was registered with the gateway.
    PaymentRequired(PaymentOrder),
}

#[derive(Clone)]
pub struct AppServices {
    store: EntityStore,
    bus: SharedBus,
    gateway: Arc<dyn PaymentGateway>,
}

impl AppServices {
    pub fn new(store: EntityStore, bus: SharedBus, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            store,
            bus,
            gateway,
        }
    }

    /// Publish a committed event. Publication failure is logged, never
    /// surfaced: the store write already happened.
    fn publish<E: Event + Serialize>(&self, entity_kind: &str, entity_id: Uuid, revision: u64, event: &E) {
        let payload = match serde_json::to_value(event) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(event_type = event.event_type(), error = %e, "event serialization failed");
                return;
            }
        };
        let envelope = EventEnvelope::new(
            Uuid::now_v7(),
            entity_kind,
            entity_id,
            revision,
            event.event_type(),
            payload,
        );
        if let Err(e) = self.bus.publish(envelope) {
            tracing::warn!(event_type = event.event_type(), error = ?e, "event publication failed");
        }
    }

    // ---- accounts ----

    pub fn register_user(
        &self,
        actor: &Actor,
        email: String,
        display_name: String,
        company_name: String,
        country: tradepost_core::CountryCode,
    ) -> DomainResult<UserProfile> {
        let now = Utc::now();
        let (user, event) = UserProfile::register(
            NewUser {
                id: actor.id,
                role: actor.role,
                email,
                display_name,
                company_name,
                country,
            },
            now,
        )?;

        let revision = self
            .store
            .users
            .put(user.clone(), ExpectedVersion::Exact(0))
            .map_err(|e| match e {
                tradepost_infra::StoreError::Concurrency(_) => {
                    DomainError::conflict("profile already registered")
                }
                other => other.into(),
            })?;
        self.publish("user", user.user_id().into(), revision, &event);
        Ok(user)
    }

    pub fn profile(&self, actor: &Actor) -> DomainResult<UserProfile> {
        Ok(self
            .store
            .users
            .get(&actor.id)?
            .ok_or(DomainError::NotFound)?
            .value)
    }

    /// Owner profile update, with the country-scoped duplicate guard run
    /// before anything is written (no partial save on a duplicate).
    pub fn update_profile(
        &self,
        actor: &Actor,
        changes: ProfileChanges,
    ) -> DomainResult<UserProfile> {
        let now = Utc::now();
        let stored = self
            .store
            .users
            .get(&actor.id)?
            .ok_or(DomainError::NotFound)?;
        let mut user = stored.value;

        if let Some(details) = &changes.verification_details {
            let country = changes
                .country
                .clone()
                .unwrap_or_else(|| user.country().clone());
            let candidates = self.store.users.list()?;
            if let Some(field) =
                find_scoped_duplicate(candidates.iter(), actor.id, &country, details)
            {
                return Err(DomainError::duplicate_field(field));
            }
        }

        let event = user.apply_profile_update(actor, changes, now)?;
        let revision = self
            .store
            .users
            .put(user.clone(), ExpectedVersion::Exact(stored.version))?;
        if let Some(event) = &event {
            self.publish("user", user.user_id().into(), revision, event);
        }
        Ok(user)
    }

    pub fn submit_verification(
        &self,
        actor: &Actor,
        documents: BTreeMap<String, String>,
    ) -> DomainResult<UserProfile> {
        let now = Utc::now();
        let stored = self
            .store
            .users
            .get(&actor.id)?
            .ok_or(DomainError::NotFound)?;
        let mut user = stored.value;

        let event = user.submit_documents(actor, documents, now)?;
        let revision = self
            .store
            .users
            .put(user.clone(), ExpectedVersion::Exact(stored.version))?;
        self.publish("user", user.user_id().into(), revision, &event);
        Ok(user)
    }

    pub fn pending_verifications(&self, actor: &Actor) -> DomainResult<Vec<UserProfile>> {
        require_admin(actor)?;
        let mut users: Vec<UserProfile> = self
            .store
            .users
            .list()?
            .into_iter()
            .filter(|u| u.verification_status() == VerificationStatus::Pending)
            .collect();
        users.sort_by_key(|u| u.user_id());
        Ok(users)
    }

    pub fn decide_verification(
        &self,
        actor: &Actor,
        user_id: UserId,
        action: &ModerationAction,
    ) -> DomainResult<UserProfile> {
        let now = Utc::now();
        let stored = self
            .store
            .users
            .get(&user_id)?
            .ok_or(DomainError::NotFound)?;
        let mut user = stored.value;

        let event = user.review_verification(action, actor, now)?;
        let revision = self
            .store
            .users
            .put(user.clone(), ExpectedVersion::Exact(stored.version))?;
        self.publish("user", user.user_id().into(), revision, &event);
        Ok(user)
    }

    // ---- catalog ----

    pub fn create_product(&self, actor: &Actor, input: NewProduct) -> DomainResult<Product> {
        if actor.role != Role::Seller {
            return Err(DomainError::Unauthorized);
        }
        let now = Utc::now();
        let user = self.profile(actor)?;

        // Entitlement check: fail closed when no plan resolves.
        let plans = self.store.plans.list()?;
        let plan = resolve_plan(user.subscription(), &plans, PlanKind::Seller, now);
        let current = self
            .store
            .products
            .list()?
            .iter()
            .filter(|p| p.seller_id() == actor.id && p.status() != ModerationStatus::Rejected)
            .count() as u64;
        if !can_create(plan, current) {
            return Err(DomainError::validation(
                "listing limit reached for the current plan",
            ));
        }

        let (product, event) = Product::submit(input, now)?;
        let revision = self
            .store
            .products
            .put(product.clone(), ExpectedVersion::Exact(0))?;
        self.publish("product", product.product_id().into(), revision, &event);
        Ok(product)
    }

    /// Visibility: owners and admins see everything; everyone else only sees
    /// approved listings (unknown and unapproved are indistinguishable).
    pub fn product_for(&self, actor: &Actor, id: ProductId) -> DomainResult<Product> {
        let product = self
            .store
            .products
            .get(&id)?
            .ok_or(DomainError::NotFound)?
            .value;
        if actor.role.is_admin() || product.seller_id() == actor.id || product.is_listed() {
            Ok(product)
        } else {
            Err(DomainError::NotFound)
        }
    }

    pub fn list_products(&self, actor: &Actor) -> DomainResult<Vec<Product>> {
        let mut products: Vec<Product> = self
            .store
            .products
            .list()?
            .into_iter()
            .filter(|p| {
                actor.role.is_admin() || p.seller_id() == actor.id || p.is_listed()
            })
            .collect();
        products.sort_by_key(|p| p.product_id());
        Ok(products)
    }

    pub fn update_product(
        &self,
        actor: &Actor,
        id: ProductId,
        changes: ProductChanges,
    ) -> DomainResult<Product> {
        let now = Utc::now();
        let stored = self
            .store
            .products
            .get(&id)?
            .ok_or(DomainError::NotFound)?;
        let mut product = stored.value;

        let event = product.apply_edit(actor, changes, now)?;
        let revision = self
            .store
            .products
            .put(product.clone(), ExpectedVersion::Exact(stored.version))?;
        if let Some(event) = &event {
            self.publish("product", product.product_id().into(), revision, event);
        }
        Ok(product)
    }

    pub fn pending_products(&self, actor: &Actor) -> DomainResult<Vec<Product>> {
        require_admin(actor)?;
        let mut products: Vec<Product> = self
            .store
            .products
            .list()?
            .into_iter()
            .filter(|p| p.status().is_pending())
            .collect();
        products.sort_by_key(|p| p.product_id());
        Ok(products)
    }

    pub fn decide_product(
        &self,
        actor: &Actor,
        id: ProductId,
        action: &ModerationAction,
    ) -> DomainResult<Product> {
        let now = Utc::now();
        let stored = self
            .store
            .products
            .get(&id)?
            .ok_or(DomainError::NotFound)?;
        let mut product = stored.value;

        let event = product.decide(action, actor, now)?;
        let revision = self
            .store
            .products
            .put(product.clone(), ExpectedVersion::Exact(stored.version))?;
        self.publish("product", product.product_id().into(), revision, &event);
        Ok(product)
    }

    // ---- sourcing ----

    pub fn create_request(&self, actor: &Actor, input: NewRequest) -> DomainResult<SourcingRequest> {
        if actor.role != Role::Buyer {
            return Err(DomainError::Unauthorized);
        }
        let now = Utc::now();
        let user = self.profile(actor)?;

        let plans = self.store.plans.list()?;
        let plan = resolve_plan(user.subscription(), &plans, PlanKind::Buyer, now);
        let current = self
            .store
            .requests
            .list()?
            .iter()
            .filter(|r| {
                r.buyer_id() == actor.id
                    && matches!(
                        r.effective_status(now),
                        RequestStatus::Pending | RequestStatus::Approved
                    )
            })
            .count() as u64;
        if !can_create(plan, current) {
            return Err(DomainError::validation(
                "open request limit reached for the current plan",
            ));
        }

        let (request, event) = SourcingRequest::submit(input, now)?;
        let revision = self
            .store
            .requests
            .put(request.clone(), ExpectedVersion::Exact(0))?;
        self.publish("sourcing_request", request.request_id().into(), revision, &event);
        Ok(request)
    }

    pub fn request_for(&self, actor: &Actor, id: RequestId) -> DomainResult<SourcingRequest> {
        let now = Utc::now();
        let request = self
            .store
            .requests
            .get(&id)?
            .ok_or(DomainError::NotFound)?
            .value;
        let visible = actor.role.is_admin()
            || request.buyer_id() == actor.id
            || request.effective_status(now) == RequestStatus::Approved;
        if visible {
            Ok(request)
        } else {
            Err(DomainError::NotFound)
        }
    }

    pub fn list_requests(&self, actor: &Actor) -> DomainResult<Vec<SourcingRequest>> {
        let now = Utc::now();
        let mut requests: Vec<SourcingRequest> = self
            .store
            .requests
            .list()?
            .into_iter()
            .filter(|r| {
                actor.role.is_admin()
                    || r.buyer_id() == actor.id
                    || r.effective_status(now) == RequestStatus::Approved
            })
            .collect();
        requests.sort_by_key(|r| r.request_id());
        Ok(requests)
    }

    pub fn update_request(
        &self,
        actor: &Actor,
        id: RequestId,
        changes: RequestChanges,
    ) -> DomainResult<SourcingRequest> {
        let now = Utc::now();
        let stored = self
            .store
            .requests
            .get(&id)?
            .ok_or(DomainError::NotFound)?;
        let mut request = stored.value;

        let event = request.apply_edit(actor, changes, now)?;
        let revision = self
            .store
            .requests
            .put(request.clone(), ExpectedVersion::Exact(stored.version))?;
        if let Some(event) = &event {
            self.publish("sourcing_request", request.request_id().into(), revision, event);
        }
        Ok(request)
    }

    pub fn pending_requests(&self, actor: &Actor) -> DomainResult<Vec<SourcingRequest>> {
        require_admin(actor)?;
        let now = Utc::now();
        let mut requests: Vec<SourcingRequest> = self
            .store
            .requests
            .list()?
            .into_iter()
            .filter(|r| r.effective_status(now) == RequestStatus::Pending)
            .collect();
        requests.sort_by_key(|r| r.request_id());
        Ok(requests)
    }

    pub fn decide_request(
        &self,
        actor: &Actor,
        id: RequestId,
        action: &ModerationAction,
    ) -> DomainResult<SourcingRequest> {
        let now = Utc::now();
        let stored = self
            .store
            .requests
            .get(&id)?
            .ok_or(DomainError::NotFound)?;
        let mut request = stored.value;

        let event = request.decide(action, actor, now)?;
        let revision = self
            .store
            .requests
            .put(request.clone(), ExpectedVersion::Exact(stored.version))?;
        self.publish("sourcing_request", request.request_id().into(), revision, &event);
        Ok(request)
    }

    // ---- billing ----

    pub fn list_plans(&self) -> DomainResult<Vec<SubscriptionPlan>> {
        let mut plans = self.store.plans.list()?;
        plans.sort_by_key(|p| p.plan_id());
        Ok(plans)
    }

    pub fn create_plan(&self, actor: &Actor, plan: SubscriptionPlan) -> DomainResult<SubscriptionPlan> {
        require_admin(actor)?;
        self.store.plans.put(plan.clone(), ExpectedVersion::Exact(0))?;
        Ok(plan)
    }

    pub fn update_plan(
        &self,
        actor: &Actor,
        plan_id: PlanId,
        changes: PlanChanges,
    ) -> DomainResult<SubscriptionPlan> {
        require_admin(actor)?;
        let stored = self
            .store
            .plans
            .get(&plan_id)?
            .ok_or(DomainError::NotFound)?;
        let mut plan = stored.value;

        plan.apply_update(changes)?;
        self.store
            .plans
            .put(plan.clone(), ExpectedVersion::Exact(stored.version))?;
        Ok(plan)
    }

    /// Start a subscription purchase. Free tiers activate immediately; paid
    /// plans go through the payment gateway first.
    pub fn subscribe(&self, actor: &Actor, plan_id: PlanId) -> DomainResult<SubscribeOutcome> {
        let now = Utc::now();
        let stored = self
            .store
            .users
            .get(&actor.id)?
            .ok_or(DomainError::NotFound)?;
        let mut user = stored.value;
        let plan = self
            .store
            .plans
            .get(&plan_id)?
            .ok_or(DomainError::NotFound)?
            .value;

        let price = plan.price_for(user.country());
        if price > 0 {
            let order = self.gateway.create_order(
                price,
                plan.currency(),
                &format!("{}:{}", actor.id, plan_id),
            )?;
            return Ok(SubscribeOutcome::PaymentRequired(order));
        }

        let expires = now + Duration::days(i64::from(plan.period_days()));
        let event = user.activate_subscription(plan_id, expires, now)?;
        let revision = self
            .store
            .users
            .put(user.clone(), ExpectedVersion::Exact(stored.version))?;
        self.publish("user", user.user_id().into(), revision, &event);
        Ok(SubscribeOutcome::Activated(user))
    }

    /// Complete a paid purchase with the gateway receipt.
    pub fn confirm_payment(
        &self,
        actor: &Actor,
        plan_id: PlanId,
        receipt: &PaymentReceipt,
    ) -> DomainResult<UserProfile> {
        let now = Utc::now();
        self.gateway.verify_receipt(receipt)?;

        let stored = self
            .store
            .users
            .get(&actor.id)?
            .ok_or(DomainError::NotFound)?;
        let mut user = stored.value;
        let plan = self
            .store
            .plans
            .get(&plan_id)?
            .ok_or(DomainError::NotFound)?
            .value;

        let expires = now + Duration::days(i64::from(plan.period_days()));
        let event = user.activate_subscription(plan_id, expires, now)?;
        let revision = self
            .store
            .users
            .put(user.clone(), ExpectedVersion::Exact(stored.version))?;
        self.publish("user", user.user_id().into(), revision, &event);
        Ok(user)
    }

    pub fn cancel_renewal(&self, actor: &Actor) -> DomainResult<UserProfile> {
        let now = Utc::now();
        let stored = self
            .store
            .users
            .get(&actor.id)?
            .ok_or(DomainError::NotFound)?;
        let mut user = stored.value;

        let event = user.cancel_renewal(actor, now)?;
        let revision = self
            .store
            .users
            .put(user.clone(), ExpectedVersion::Exact(stored.version))?;
        self.publish("user", user.user_id().into(), revision, &event);
        Ok(user)
    }

    // ---- categories ----

    pub fn list_categories(&self) -> DomainResult<Vec<Category>> {
        let mut categories = self.store.categories.list()?;
        categories.sort_by_key(|c| c.id);
        Ok(categories)
    }

    pub fn category_path(&self, id: CategoryId) -> DomainResult<Vec<Category>> {
        let tree = CategoryTree::new(self.store.categories.list()?);
        let path = tree.path(id)?;
        Ok(path
            .into_iter()
            .filter_map(|cid| tree.get(cid).cloned())
            .collect())
    }

    /// The category itself plus its whole subtree.
    pub fn category_descendants(&self, id: CategoryId) -> DomainResult<Vec<Category>> {
        let tree = CategoryTree::new(self.store.categories.list()?);
        let ids = tree.descendants(id)?;
        Ok(ids
            .into_iter()
            .filter_map(|cid| tree.get(cid).cloned())
            .collect())
    }

    pub fn create_category(
        &self,
        actor: &Actor,
        parent_id: Option<CategoryId>,
        name: String,
    ) -> DomainResult<Category> {
        require_admin(actor)?;
        if let Some(parent) = parent_id {
            if self.store.categories.get(&parent)?.is_none() {
                return Err(DomainError::validation("parent category does not exist"));
            }
        }
        let category = Category::new(CategoryId::new(), parent_id, name)?;
        self.store
            .categories
            .put(category.clone(), ExpectedVersion::Exact(0))?;
        Ok(category)
    }
}

//! `tradepost-billing` — subscription plans, entitlements, and the payment
//! gateway boundary.
//!
//! Entitlement checks fail closed: no resolvable plan means no capacity.

pub mod entitlement;
pub mod gateway;
pub mod plan;

pub use entitlement::{can_create, resolve_plan};
pub use gateway::{FakeGateway, PaymentGateway, PaymentOrder, PaymentReceipt};
pub use plan::{PlanChanges, PlanKind, PlanLimit, SubscriptionPlan};

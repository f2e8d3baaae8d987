//! Plan resolution and creation-capacity checks.
//!
//! Both halves fail closed: an expired subscription falls back to the free
//! tier, and a user with no resolvable plan cannot create anything.

use chrono::{DateTime, Utc};

use tradepost_accounts::Subscription;

use crate::plan::{PlanKind, SubscriptionPlan};

/// Resolve the plan governing a user's capacity right now.
///
/// An active paid subscription wins; otherwise the free tier of the requested
/// kind applies. When several free plans exist the lowest plan id is chosen so
/// the fallback is stable across calls. `None` means no entitlement at all.
pub fn resolve_plan<'a>(
    subscription: Option<&Subscription>,
    plans: &'a [SubscriptionPlan],
    kind: PlanKind,
    now: DateTime<Utc>,
) -> Option<&'a SubscriptionPlan> {
    if let Some(sub) = subscription {
        if sub.is_active(now) {
            if let Some(plan) = plans
                .iter()
                .find(|p| p.plan_id() == sub.plan_id && p.kind() == kind)
            {
                return Some(plan);
            }
            // Subscribed to a plan that no longer exists (or the wrong kind);
            // fall through to the free tier rather than granting nothing.
        }
    }

    plans
        .iter()
        .filter(|p| p.kind() == kind && p.is_free())
        .min_by_key(|p| p.plan_id())
}

/// Whether a user holding `current_count` items may create one more under
/// `plan`. No plan means no.
pub fn can_create(plan: Option<&SubscriptionPlan>, current_count: u64) -> bool {
    match plan {
        Some(plan) => plan.limit().allows(current_count),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use proptest::prelude::*;

    use tradepost_core::PlanId;

    use super::*;
    use crate::plan::PlanLimit;

    fn plan(kind: PlanKind, price: u64, limit: i64) -> SubscriptionPlan {
        SubscriptionPlan::new(
            PlanId::new(),
            kind,
            "Test Plan",
            price,
            "USD",
            PlanLimit::new(limit).unwrap(),
            30,
        )
        .unwrap()
    }

    fn sub(plan_id: PlanId, expires_in: Duration, now: DateTime<Utc>) -> Subscription {
        Subscription {
            plan_id,
            expires_at: now + expires_in,
            renewal_cancelled: false,
        }
    }

    #[test]
    fn active_subscription_resolves_its_plan() {
        let now = Utc::now();
        let paid = plan(PlanKind::Seller, 4900, 50);
        let free = plan(PlanKind::Seller, 0, 3);
        let plans = vec![free, paid.clone()];

        let s = sub(paid.plan_id(), Duration::days(10), now);
        let resolved = resolve_plan(Some(&s), &plans, PlanKind::Seller, now).unwrap();
        assert_eq!(resolved.plan_id(), paid.plan_id());
    }

    #[test]
    fn expired_subscription_falls_back_to_free_tier() {
        let now = Utc::now();
        let paid = plan(PlanKind::Seller, 4900, 50);
        let free = plan(PlanKind::Seller, 0, 3);
        let plans = vec![paid.clone(), free.clone()];

        let s = sub(paid.plan_id(), Duration::days(-1), now);
        let resolved = resolve_plan(Some(&s), &plans, PlanKind::Seller, now).unwrap();
        assert_eq!(resolved.plan_id(), free.plan_id());
    }

    #[test]
    fn cancelled_renewal_does_not_revoke_active_term() {
        let now = Utc::now();
        let paid = plan(PlanKind::Seller, 4900, 50);
        let plans = vec![paid.clone()];

        let mut s = sub(paid.plan_id(), Duration::days(10), now);
        s.renewal_cancelled = true;
        let resolved = resolve_plan(Some(&s), &plans, PlanKind::Seller, now).unwrap();
        assert_eq!(resolved.plan_id(), paid.plan_id());
    }

    #[test]
    fn missing_plan_falls_back_to_free_tier() {
        let now = Utc::now();
        let free = plan(PlanKind::Seller, 0, 3);
        let plans = vec![free.clone()];

        let s = sub(PlanId::new(), Duration::days(10), now);
        let resolved = resolve_plan(Some(&s), &plans, PlanKind::Seller, now).unwrap();
        assert_eq!(resolved.plan_id(), free.plan_id());
    }

    #[test]
    fn kind_mismatch_is_not_an_entitlement() {
        let now = Utc::now();
        let buyer_paid = plan(PlanKind::Buyer, 2900, 20);
        let plans = vec![buyer_paid.clone()];

        let s = sub(buyer_paid.plan_id(), Duration::days(10), now);
        // A buyer plan grants nothing on the seller side.
        assert!(resolve_plan(Some(&s), &plans, PlanKind::Seller, now).is_none());
    }

    #[test]
    fn no_plans_at_all_means_no_entitlement() {
        let now = Utc::now();
        assert!(resolve_plan(None, &[], PlanKind::Buyer, now).is_none());
    }

    #[test]
    fn free_tier_fallback_is_stable() {
        let now = Utc::now();
        let a = plan(PlanKind::Buyer, 0, 2);
        let b = plan(PlanKind::Buyer, 0, 5);
        let expected = a.plan_id().min(b.plan_id());

        let forward = vec![a.clone(), b.clone()];
        let backward = vec![b, a];
        assert_eq!(
            resolve_plan(None, &forward, PlanKind::Buyer, now).unwrap().plan_id(),
            expected
        );
        assert_eq!(
            resolve_plan(None, &backward, PlanKind::Buyer, now).unwrap().plan_id(),
            expected
        );
    }

    #[test]
    fn can_create_fails_closed() {
        assert!(!can_create(None, 0));

        let capped = plan(PlanKind::Seller, 0, 2);
        assert!(can_create(Some(&capped), 1));
        assert!(!can_create(Some(&capped), 2));

        let unlimited = SubscriptionPlan::new(
            PlanId::new(),
            PlanKind::Seller,
            "Enterprise",
            99900,
            "USD",
            PlanLimit::UNLIMITED,
            365,
        )
        .unwrap();
        assert!(can_create(Some(&unlimited), u64::MAX));
    }

    proptest! {
        // Capacity is monotone: once a count is denied, every larger count is
        // denied too.
        #[test]
        fn denial_is_monotone(limit in 0i64..1000, count in 0u64..2000) {
            let p = plan(PlanKind::Seller, 0, limit);
            if !can_create(Some(&p), count) {
                prop_assert!(!can_create(Some(&p), count + 1));
            }
        }

        // An unlimited plan never denies.
        #[test]
        fn unlimited_never_denies(count in 0u64..u64::MAX) {
            let p = plan(PlanKind::Buyer, 0, -1);
            prop_assert!(can_create(Some(&p), count));
        }
    }
}

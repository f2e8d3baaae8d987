use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tradepost_core::{CountryCode, DomainError, DomainResult, Entity, PlanId};

/// Which side of the marketplace a plan entitles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanKind {
    /// Caps active product listings.
    Seller,
    /// Caps open sourcing requests.
    Buyer,
}

/// Capacity granted by a plan. `-1` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanLimit(i64);

impl PlanLimit {
    pub const UNLIMITED: PlanLimit = PlanLimit(-1);

    pub fn new(raw: i64) -> DomainResult<Self> {
        if raw < -1 {
            return Err(DomainError::validation(format!(
                "plan limit must be -1 or non-negative, got {raw}"
            )));
        }
        Ok(Self(raw))
    }

    pub fn is_unlimited(&self) -> bool {
        self.0 == -1
    }

    /// Whether a user already holding `current_count` items may create one
    /// more.
    pub fn allows(&self, current_count: u64) -> bool {
        self.is_unlimited() || current_count < self.0 as u64
    }

    pub fn raw(&self) -> i64 {
        self.0
    }
}

/// A purchasable (or free) subscription plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    id: PlanId,
    kind: PlanKind,
    name: String,
    /// Base price in minor units. Zero marks the free tier.
    price_minor: u64,
    currency: String,
    limit: PlanLimit,
    /// Per-country price overrides, in minor units of `currency`.
    regional_prices: BTreeMap<CountryCode, u64>,
    period_days: u32,
}

impl Entity for SubscriptionPlan {
    type Id = PlanId;

    fn id(&self) -> &PlanId {
        &self.id
    }
}

impl SubscriptionPlan {
    pub fn new(
        id: PlanId,
        kind: PlanKind,
        name: impl Into<String>,
        price_minor: u64,
        currency: impl Into<String>,
        limit: PlanLimit,
        period_days: u32,
    ) -> DomainResult<Self> {
        let name = name.into();
        let currency = currency.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("plan name cannot be empty"));
        }
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(DomainError::validation(format!(
                "currency must be a three-letter uppercase code, got '{currency}'"
            )));
        }
        if period_days == 0 {
            return Err(DomainError::validation("plan period must be at least one day"));
        }
        Ok(Self {
            id,
            kind,
            name,
            price_minor,
            currency,
            limit,
            regional_prices: BTreeMap::new(),
            period_days,
        })
    }

    pub fn with_regional_price(mut self, country: CountryCode, price_minor: u64) -> Self {
        self.regional_prices.insert(country, price_minor);
        self
    }

    pub fn plan_id(&self) -> PlanId {
        self.id
    }

    pub fn kind(&self) -> PlanKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn limit(&self) -> PlanLimit {
        self.limit
    }

    pub fn period_days(&self) -> u32 {
        self.period_days
    }

    /// Base price before any regional override.
    pub fn price_minor(&self) -> u64 {
        self.price_minor
    }

    pub fn is_free(&self) -> bool {
        self.price_minor == 0
    }

    /// Price for a buyer in `country`, falling back to the base price when no
    /// regional override exists.
    pub fn price_for(&self, country: &CountryCode) -> u64 {
        self.regional_prices
            .get(country)
            .copied()
            .unwrap_or(self.price_minor)
    }

    /// Apply an admin plan update. The plan's kind is immutable; a replacement
    /// regional price table swaps the whole table.
    pub fn apply_update(&mut self, changes: PlanChanges) -> DomainResult<()> {
        if let Some(name) = changes.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("plan name cannot be empty"));
            }
            self.name = name;
        }
        if let Some(currency) = changes.currency {
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
                return Err(DomainError::validation(format!(
                    "currency must be a three-letter uppercase code, got '{currency}'"
                )));
            }
            self.currency = currency;
        }
        if let Some(price_minor) = changes.price_minor {
            self.price_minor = price_minor;
        }
        if let Some(limit) = changes.limit {
            self.limit = limit;
        }
        if let Some(period_days) = changes.period_days {
            if period_days == 0 {
                return Err(DomainError::validation("period must be at least one day"));
            }
            self.period_days = period_days;
        }
        if let Some(regional_prices) = changes.regional_prices {
            self.regional_prices = regional_prices;
        }
        Ok(())
    }
}

/// Admin-editable plan fields. `None` = leave untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanChanges {
    pub name: Option<String>,
    pub price_minor: Option<u64>,
    pub currency: Option<String>,
    pub limit: Option<PlanLimit>,
    pub period_days: Option<u32>,
    pub regional_prices: Option<BTreeMap<CountryCode, u64>>,
}

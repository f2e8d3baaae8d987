//! Request/response shapes for the HTTP surface.
//!
//! Inputs that carry validated value objects (country codes, prices) arrive
//! as raw strings/integers and are parsed at this boundary so invalid values
//! fail as `validation_error` before touching the domain.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradepost_accounts::{ProfileChanges, Subscription, UserProfile, VerificationStatus};
use tradepost_auth::Role;
use tradepost_billing::{
    PaymentOrder, PaymentReceipt, PlanChanges, PlanKind, PlanLimit, SubscriptionPlan,
};
use tradepost_catalog::{Category, NewProduct, Product, ProductChanges};
use tradepost_core::{
    CategoryId, CountryCode, DomainError, DomainResult, PlanId, Price, ProductId, RequestId,
    UserId,
};
use tradepost_moderation::{ModerationAction, ModerationStatus};
use tradepost_sourcing::{NewRequest, RequestChanges, SourcingRequest};

// ---- shared ----

/// Admin moderation decision body.
#[derive(Debug, Deserialize)]
pub struct DecisionBody {
    pub action: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl DecisionBody {
    pub fn into_action(self) -> DomainResult<ModerationAction> {
        match self.action.as_str() {
            "approve" => Ok(ModerationAction::Approve),
            "reject" => Ok(ModerationAction::Reject {
                reason: self.reason.unwrap_or_default(),
            }),
            other => Err(DomainError::validation(format!(
                "unknown action '{other}', expected 'approve' or 'reject'"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PriceBody {
    pub amount_minor: u64,
    pub currency: String,
}

impl PriceBody {
    pub fn into_price(self) -> DomainResult<Price> {
        Price::new(self.amount_minor, self.currency)
    }
}

fn status_str(status: ModerationStatus) -> &'static str {
    match status {
        ModerationStatus::Pending => "pending",
        ModerationStatus::Approved => "approved",
        ModerationStatus::Rejected => "rejected",
    }
}

// ---- accounts ----

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub company_name: String,
    pub country: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileBody {
    pub display_name: Option<String>,
    pub company_name: Option<String>,
    pub country: Option<String>,
    pub verification_details: Option<BTreeMap<String, String>>,
}

impl UpdateProfileBody {
    pub fn into_changes(self) -> DomainResult<ProfileChanges> {
        let country = self.country.map(CountryCode::new).transpose()?;
        Ok(ProfileChanges {
            display_name: self.display_name,
            company_name: self.company_name,
            country,
            verification_details: self.verification_details,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitDocumentsBody {
    pub documents: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionView {
    pub plan_id: PlanId,
    pub expires_at: DateTime<Utc>,
    pub renewal_cancelled: bool,
    pub active: bool,
}

impl SubscriptionView {
    fn from_subscription(s: &Subscription, now: DateTime<Utc>) -> Self {
        Self {
            plan_id: s.plan_id,
            expires_at: s.expires_at,
            renewal_cancelled: s.renewal_cancelled,
            active: s.is_active(now),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub role: Role,
    pub email: String,
    pub display_name: String,
    pub company_name: String,
    pub country: String,
    pub verification_status: VerificationStatus,
    pub verification_details: BTreeMap<String, String>,
    pub verification_note: Option<String>,
    pub subscription: Option<SubscriptionView>,
}

impl UserView {
    pub fn from_profile(user: &UserProfile) -> Self {
        let now = Utc::now();
        Self {
            id: user.user_id(),
            role: user.role(),
            email: user.email().to_string(),
            display_name: user.display_name().to_string(),
            company_name: user.company_name().to_string(),
            country: user.country().to_string(),
            verification_status: user.verification_status(),
            verification_details: user.verification_details().clone(),
            verification_note: user.verification_note().map(str::to_string),
            subscription: user
                .subscription()
                .map(|s| SubscriptionView::from_subscription(s, now)),
        }
    }
}

// ---- catalog ----

#[derive(Debug, Deserialize)]
pub struct CreateProductBody {
    pub category_id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: PriceBody,
    #[serde(default)]
    pub stock: u64,
    #[serde(default)]
    pub lead_time_days: u32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
}

impl CreateProductBody {
    pub fn into_new_product(self, seller_id: UserId) -> DomainResult<NewProduct> {
        Ok(NewProduct {
            id: ProductId::new(),
            seller_id,
            category_id: self.category_id,
            name: self.name,
            description: self.description,
            price: self.price.into_price()?,
            stock: self.stock,
            lead_time_days: self.lead_time_days,
            images: self.images,
            specifications: self.specifications,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductBody {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub price: Option<PriceBody>,
    pub stock: Option<u64>,
    pub lead_time_days: Option<u32>,
    pub images: Option<Vec<String>>,
    pub specifications: Option<BTreeMap<String, String>>,
}

impl UpdateProductBody {
    pub fn into_changes(self) -> DomainResult<ProductChanges> {
        let price = self.price.map(PriceBody::into_price).transpose()?;
        Ok(ProductChanges {
            name: self.name,
            description: self.description,
            category_id: self.category_id,
            price,
            stock: self.stock,
            lead_time_days: self.lead_time_days,
            images: self.images,
            specifications: self.specifications,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ProductView {
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
    pub status: &'static str,
    pub rejection_reason: Option<String>,
}

impl ProductView {
    pub fn from_product(p: &Product) -> Self {
        Self {
            id: p.product_id(),
            seller_id: p.seller_id(),
            category_id: p.category_id(),
            name: p.name().to_string(),
            description: p.description().to_string(),
            price: p.price().clone(),
            stock: p.stock(),
            lead_time_days: p.lead_time_days(),
            images: p.images().to_vec(),
            specifications: p.specifications().clone(),
            status: status_str(p.status()),
            rejection_reason: p.rejection_reason().map(str::to_string),
        }
    }
}

// ---- sourcing ----

#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    pub category_id: CategoryId,
    pub title: String,
    #[serde(default)]
    pub details: String,
    pub quantity: u64,
    pub target_price: PriceBody,
    pub expires_at: DateTime<Utc>,
}

impl CreateRequestBody {
    pub fn into_new_request(self, buyer_id: UserId) -> DomainResult<NewRequest> {
        Ok(NewRequest {
            id: RequestId::new(),
            buyer_id,
            category_id: self.category_id,
            title: self.title,
            details: self.details,
            quantity: self.quantity,
            target_price: self.target_price.into_price()?,
            expires_at: self.expires_at,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequestBody {
    pub title: Option<String>,
    pub details: Option<String>,
    pub category_id: Option<CategoryId>,
    pub quantity: Option<u64>,
    pub target_price: Option<PriceBody>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl UpdateRequestBody {
    pub fn into_changes(self) -> DomainResult<RequestChanges> {
        let target_price = self.target_price.map(PriceBody::into_price).transpose()?;
        Ok(RequestChanges {
            title: self.title,
            details: self.details,
            category_id: self.category_id,
            quantity: self.quantity,
            target_price,
            expires_at: self.expires_at,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct RequestView {
    pub id: RequestId,
    pub buyer_id: UserId,
    pub category_id: CategoryId,
    pub title: String,
    pub details: String,
    pub quantity: u64,
    pub target_price: Price,
    pub expires_at: DateTime<Utc>,
    /// Effective status with expiry folded in, so a lapsed request reads
    /// `expired` even though the stored decision was `approved`.
    pub status: String,
    pub rejection_reason: Option<String>,
}

impl RequestView {
    pub fn from_request(r: &SourcingRequest) -> Self {
        let now = Utc::now();
        Self {
            id: r.request_id(),
            buyer_id: r.buyer_id(),
            category_id: r.category_id(),
            title: r.title().to_string(),
            details: r.details().to_string(),
            quantity: r.quantity(),
            target_price: r.target_price().clone(),
            expires_at: r.expires_at(),
            status: r.effective_status(now).to_string(),
            rejection_reason: r.rejection_reason().map(str::to_string),
        }
    }
}

// ---- billing ----

#[derive(Debug, Deserialize)]
pub struct CreatePlanBody {
    pub kind: PlanKind,
    pub name: String,
    pub price_minor: u64,
    pub currency: String,
    pub limit: i64,
    pub period_days: u32,
    #[serde(default)]
    pub regional_prices: BTreeMap<String, u64>,
}

impl CreatePlanBody {
    pub fn into_plan(self) -> DomainResult<SubscriptionPlan> {
        let mut plan = SubscriptionPlan::new(
            PlanId::new(),
            self.kind,
            self.name,
            self.price_minor,
            self.currency,
            PlanLimit::new(self.limit)?,
            self.period_days,
        )?;
        for (country, price) in self.regional_prices {
            plan = plan.with_regional_price(CountryCode::new(country)?, price);
        }
        Ok(plan)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePlanBody {
    pub name: Option<String>,
    pub price_minor: Option<u64>,
    pub currency: Option<String>,
    pub limit: Option<i64>,
    pub period_days: Option<u32>,
    pub regional_prices: Option<BTreeMap<String, u64>>,
}

impl UpdatePlanBody {
    pub fn into_changes(self) -> DomainResult<PlanChanges> {
        let limit = self.limit.map(PlanLimit::new).transpose()?;
        let regional_prices = self
            .regional_prices
            .map(|prices| {
                prices
                    .into_iter()
                    .map(|(country, price)| Ok((CountryCode::new(country)?, price)))
                    .collect::<DomainResult<BTreeMap<CountryCode, u64>>>()
            })
            .transpose()?;
        Ok(PlanChanges {
            name: self.name,
            price_minor: self.price_minor,
            currency: self.currency,
            limit,
            period_days: self.period_days,
            regional_prices,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscribeBody {
    pub plan_id: PlanId,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentBody {
    pub plan_id: PlanId,
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

impl ConfirmPaymentBody {
    pub fn receipt(&self) -> PaymentReceipt {
        PaymentReceipt {
            order_id: self.order_id.clone(),
            payment_id: self.payment_id.clone(),
            signature: self.signature.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlanView {
    pub id: PlanId,
    pub kind: PlanKind,
    pub name: String,
    pub price_minor: u64,
    pub currency: String,
    pub limit: i64,
    pub period_days: u32,
}

impl PlanView {
    pub fn from_plan(plan: &SubscriptionPlan, country: Option<&CountryCode>) -> Self {
        let price_minor = match country {
            Some(c) => plan.price_for(c),
            None => plan.price_minor(),
        };
        Self {
            id: plan.plan_id(),
            kind: plan.kind(),
            name: plan.name().to_string(),
            price_minor,
            currency: plan.currency().to_string(),
            limit: plan.limit().raw(),
            period_days: plan.period_days(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderView {
    pub order_id: String,
    pub amount_minor: u64,
    pub currency: String,
}

impl OrderView {
    pub fn from_order(order: &PaymentOrder) -> Self {
        Self {
            order_id: order.order_id.clone(),
            amount_minor: order.amount_minor,
            currency: order.currency.clone(),
        }
    }
}

// ---- categories ----

#[derive(Debug, Deserialize)]
pub struct CreateCategoryBody {
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryView {
    pub id: CategoryId,
    pub parent_id: Option<CategoryId>,
    pub name: String,
}

impl CategoryView {
    pub fn from_category(c: &Category) -> Self {
        Self {
            id: c.id,
            parent_id: c.parent_id,
            name: c.name.clone(),
        }
    }
}

use std::sync::Arc;

use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::json;

use crate::app::dto::{ConfirmPaymentBody, OrderView, PlanView, SubscribeBody, UserView};
use crate::app::errors::ApiResult;
use crate::app::services::{AppServices, SubscribeOutcome};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/billing/plans", get(plans))
        .route("/billing/subscribe", post(subscribe))
        .route("/billing/confirm", post(confirm))
        .route("/billing/cancel-renewal", post(cancel_renewal))
}

/// Plans with the caller's regional price applied when their profile carries
/// a country; unregistered callers see base prices.
async fn plans(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> ApiResult<impl IntoResponse> {
    let country = services
        .profile(ctx.actor())
        .ok()
        .map(|u| u.country().clone());
    let plans = services.list_plans()?;
    let views: Vec<PlanView> = plans
        .iter()
        .map(|p| PlanView::from_plan(p, country.as_ref()))
        .collect();
    Ok(Json(json!({ "success": true, "plans": views })))
}

async fn subscribe(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<SubscribeBody>,
) -> ApiResult<impl IntoResponse> {
    match services.subscribe(ctx.actor(), body.plan_id)? {
        SubscribeOutcome::Activated(user) => Ok(Json(json!({
            "success": true,
            "payment_required": false,
            "user": UserView::from_profile(&user),
        }))),
        SubscribeOutcome::PaymentRequired(order) => Ok(Json(json!({
            "success": true,
            "payment_required": true,
            "order": OrderView::from_order(&order),
        }))),
    }
}

async fn confirm(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<ConfirmPaymentBody>,
) -> ApiResult<impl IntoResponse> {
    let receipt = body.receipt();
    let user = services.confirm_payment(ctx.actor(), body.plan_id, &receipt)?;
    Ok(Json(json!({ "success": true, "user": UserView::from_profile(&user) })))
}

async fn cancel_renewal(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> ApiResult<impl IntoResponse> {
    let user = services.cancel_renewal(ctx.actor())?;
    Ok(Json(json!({ "success": true, "user": UserView::from_profile(&user) })))
}

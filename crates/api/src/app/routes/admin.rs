use std::sync::Arc;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use serde_json::json;

use tradepost_core::{PlanId, ProductId, RequestId, UserId};

use crate::app::dto::{
    CategoryView, CreateCategoryBody, CreatePlanBody, DecisionBody, PlanView, ProductView,
    RequestView, UpdatePlanBody, UserView,
};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::context::ActorContext;

use super::parse_id;

pub fn router() -> Router {
    Router::new()
        .route("/admin/products/pending", get(pending_products))
        .route("/admin/products/:id/decision", post(decide_product))
        .route("/admin/requests/pending", get(pending_requests))
        .route("/admin/requests/:id/decision", post(decide_request))
        .route("/admin/verifications/pending", get(pending_verifications))
        .route(
            "/admin/users/:id/verification-decision",
            post(decide_verification),
        )
        .route("/admin/plans", post(create_plan))
        .route("/admin/plans/:id", put(update_plan))
        .route("/admin/categories", post(create_category))
}

async fn pending_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> ApiResult<impl IntoResponse> {
    let products = services.pending_products(ctx.actor())?;
    let views: Vec<ProductView> = products.iter().map(ProductView::from_product).collect();
    Ok(Json(json!({ "success": true, "products": views })))
}

async fn decide_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<DecisionBody>,
) -> ApiResult<impl IntoResponse> {
    let id: ProductId = parse_id(&id)?;
    let action = body.into_action()?;
    let product = services.decide_product(ctx.actor(), id, &action)?;
    Ok(Json(json!({ "success": true, "product": ProductView::from_product(&product) })))
}

async fn pending_requests(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> ApiResult<impl IntoResponse> {
    let requests = services.pending_requests(ctx.actor())?;
    let views: Vec<RequestView> = requests.iter().map(RequestView::from_request).collect();
    Ok(Json(json!({ "success": true, "requests": views })))
}

async fn decide_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<DecisionBody>,
) -> ApiResult<impl IntoResponse> {
    let id: RequestId = parse_id(&id)?;
    let action = body.into_action()?;
    let request = services.decide_request(ctx.actor(), id, &action)?;
    Ok(Json(json!({ "success": true, "request": RequestView::from_request(&request) })))
}

async fn pending_verifications(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> ApiResult<impl IntoResponse> {
    let users = services.pending_verifications(ctx.actor())?;
    let views: Vec<UserView> = users.iter().map(UserView::from_profile).collect();
    Ok(Json(json!({ "success": true, "users": views })))
}

async fn decide_verification(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<DecisionBody>,
) -> ApiResult<impl IntoResponse> {
    let id: UserId = parse_id(&id)?;
    let action = body.into_action()?;
    let user = services.decide_verification(ctx.actor(), id, &action)?;
    Ok(Json(json!({ "success": true, "user": UserView::from_profile(&user) })))
}

async fn create_plan(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<CreatePlanBody>,
) -> ApiResult<impl IntoResponse> {
    let plan = body.into_plan()?;
    let plan = services.create_plan(ctx.actor(), plan)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "plan": PlanView::from_plan(&plan, None) })),
    ))
}

async fn update_plan(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<UpdatePlanBody>,
) -> ApiResult<impl IntoResponse> {
    let id: PlanId = parse_id(&id)?;
    let changes = body.into_changes()?;
    let plan = services.update_plan(ctx.actor(), id, changes)?;
    Ok(Json(json!({ "success": true, "plan": PlanView::from_plan(&plan, None) })))
}

async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<CreateCategoryBody>,
) -> ApiResult<impl IntoResponse> {
    let category = services.create_category(ctx.actor(), body.parent_id, body.name)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "category": CategoryView::from_category(&category) })),
    ))
}

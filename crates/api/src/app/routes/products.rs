use std::sync::Arc;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;

use tradepost_core::ProductId;

use crate::app::dto::{CreateProductBody, ProductView, UpdateProductBody};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::context::ActorContext;

use super::parse_id;

pub fn router() -> Router {
    Router::new()
        .route("/products", get(list).post(create))
        .route("/products/:id", get(show).put(update))
}

async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<CreateProductBody>,
) -> ApiResult<impl IntoResponse> {
    let actor = ctx.actor().clone();
    let input = body.into_new_product(actor.id)?;
    let product = services.create_product(&actor, input)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "product": ProductView::from_product(&product) })),
    ))
}

async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> ApiResult<impl IntoResponse> {
    let products = services.list_products(ctx.actor())?;
    let views: Vec<ProductView> = products.iter().map(ProductView::from_product).collect();
    Ok(Json(json!({ "success": true, "products": views })))
}

async fn show(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id: ProductId = parse_id(&id)?;
    let product = services.product_for(ctx.actor(), id)?;
    Ok(Json(json!({ "success": true, "product": ProductView::from_product(&product) })))
}

async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<UpdateProductBody>,
) -> ApiResult<impl IntoResponse> {
    let id: ProductId = parse_id(&id)?;
    let changes = body.into_changes()?;
    let product = services.update_product(ctx.actor(), id, changes)?;
    Ok(Json(json!({ "success": true, "product": ProductView::from_product(&product) })))
}

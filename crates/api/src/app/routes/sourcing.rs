use std::sync::Arc;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;

use tradepost_core::RequestId;

use crate::app::dto::{CreateRequestBody, RequestView, UpdateRequestBody};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::context::ActorContext;

use super::parse_id;

pub fn router() -> Router {
    Router::new()
        .route("/requests", get(list).post(create))
        .route("/requests/:id", get(show).put(update))
}

async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<CreateRequestBody>,
) -> ApiResult<impl IntoResponse> {
    let actor = ctx.actor().clone();
    let input = body.into_new_request(actor.id)?;
    let request = services.create_request(&actor, input)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "request": RequestView::from_request(&request) })),
    ))
}

async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> ApiResult<impl IntoResponse> {
    let requests = services.list_requests(ctx.actor())?;
    let views: Vec<RequestView> = requests.iter().map(RequestView::from_request).collect();
    Ok(Json(json!({ "success": true, "requests": views })))
}

async fn show(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id: RequestId = parse_id(&id)?;
    let request = services.request_for(ctx.actor(), id)?;
    Ok(Json(json!({ "success": true, "request": RequestView::from_request(&request) })))
}

async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<UpdateRequestBody>,
) -> ApiResult<impl IntoResponse> {
    let id: RequestId = parse_id(&id)?;
    let changes = body.into_changes()?;
    let request = services.update_request(ctx.actor(), id, changes)?;
    Ok(Json(json!({ "success": true, "request": RequestView::from_request(&request) })))
}

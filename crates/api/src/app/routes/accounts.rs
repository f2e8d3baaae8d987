use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::json;

use tradepost_core::CountryCode;

use crate::app::dto::{RegisterBody, SubmitDocumentsBody, UpdateProfileBody, UserView};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/users", post(register))
        .route("/users/me", get(me).put(update_profile))
        .route("/users/me/verification", post(submit_verification))
}

async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<RegisterBody>,
) -> ApiResult<impl IntoResponse> {
    let country = CountryCode::new(&body.country)?;
    let user = services.register_user(
        ctx.actor(),
        body.email,
        body.display_name,
        body.company_name,
        country,
    )?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "user": UserView::from_profile(&user) })),
    ))
}

async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> ApiResult<impl IntoResponse> {
    let user = services.profile(ctx.actor())?;
    Ok(Json(json!({ "success": true, "user": UserView::from_profile(&user) })))
}

async fn update_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<UpdateProfileBody>,
) -> ApiResult<impl IntoResponse> {
    let changes = body.into_changes()?;
    let user = services.update_profile(ctx.actor(), changes)?;
    Ok(Json(json!({ "success": true, "user": UserView::from_profile(&user) })))
}

async fn submit_verification(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<SubmitDocumentsBody>,
) -> ApiResult<impl IntoResponse> {
    let user = services.submit_verification(ctx.actor(), body.documents)?;
    Ok(Json(json!({ "success": true, "user": UserView::from_profile(&user) })))
}

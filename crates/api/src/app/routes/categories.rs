use std::sync::Arc;

use axum::extract::Path;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;

use tradepost_core::CategoryId;

use crate::app::dto::CategoryView;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

use super::parse_id;

pub fn router() -> Router {
    Router::new()
        .route("/categories", get(list))
        .route("/categories/:id/path", get(path))
        .route("/categories/:id/descendants", get(descendants))
}

async fn list(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<impl IntoResponse> {
    let categories = services.list_categories()?;
    let views: Vec<CategoryView> = categories.iter().map(CategoryView::from_category).collect();
    Ok(Json(json!({ "success": true, "categories": views })))
}

/// Root-to-leaf breadcrumb for a category.
async fn path(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id: CategoryId = parse_id(&id)?;
    let path = services.category_path(id)?;
    let views: Vec<CategoryView> = path.iter().map(CategoryView::from_category).collect();
    Ok(Json(json!({ "success": true, "path": views })))
}

/// The category plus its whole subtree.
async fn descendants(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id: CategoryId = parse_id(&id)?;
    let categories = services.category_descendants(id)?;
    let views: Vec<CategoryView> = categories.iter().map(CategoryView::from_category).collect();
    Ok(Json(json!({ "success": true, "categories": views })))
}

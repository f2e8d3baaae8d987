//! Application assembly: store selection, event relay, and routing.

mod dto;
mod errors;
mod routes;
mod services;

use std::sync::Arc;

use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router, middleware};
use serde_json::json;

use tradepost_auth::Hs256JwtValidator;
use tradepost_billing::{FakeGateway, PaymentGateway};
use tradepost_events::InMemoryEventBus;
use tradepost_infra::collection::ensure_schema;
use tradepost_infra::notify::spawn_relay;
use tradepost_infra::{EntityStore, LogNotifier, Notifier};

use crate::context::ActorContext;
use crate::middleware::{AuthState, auth_middleware};

use services::AppServices;

/// Build the full application router.
///
/// `USE_PERSISTENT_STORES=1` selects the Postgres-backed store (requires
/// `DATABASE_URL`); anything else runs fully in memory. Configuration
/// failures here are fatal by design: the process must not come up half
/// wired.
pub async fn build_app(jwt_secret: String) -> Router {
    let store = if persistent_stores_enabled() {
        let url = std::env::var("DATABASE_URL")
            .expect("USE_PERSISTENT_STORES is set but DATABASE_URL is not");
        let pool = sqlx::PgPool::connect(&url)
            .await
            .expect("failed to connect to DATABASE_URL");
        ensure_schema(&pool).await.expect("failed to ensure schema");
        tracing::info!("using postgres-backed stores");
        EntityStore::postgres(pool)
    } else {
        tracing::info!("using in-memory stores");
        EntityStore::in_memory()
    };

    let bus = Arc::new(InMemoryEventBus::new());
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    // Relay runs for the process lifetime; the handle is dropped on purpose.
    let _relay = spawn_relay(Arc::clone(&bus), notifier);

    let gateway: Arc<dyn PaymentGateway> = Arc::new(FakeGateway::new());
    let services = Arc::new(AppServices::new(store, bus, gateway));

    let auth = AuthState {
        jwt: Arc::new(Hs256JwtValidator::new(jwt_secret.into_bytes())),
    };

    let protected = Router::new()
        .route("/whoami", get(whoami))
        .merge(routes::accounts::router())
        .merge(routes::products::router())
        .merge(routes::sourcing::router())
        .merge(routes::billing::router())
        .merge(routes::categories::router())
        .merge(routes::admin::router())
        .layer(middleware::from_fn_with_state(auth, auth_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(Extension(services))
}

fn persistent_stores_enabled() -> bool {
    std::env::var("USE_PERSISTENT_STORES")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "success": true, "status": "ok" }))
}

async fn whoami(Extension(ctx): Extension<ActorContext>) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "user_id": ctx.user_id(),
        "role": ctx.role(),
    }))
}

//! Black-box tests against the HTTP surface: real listener, real tokens,
//! in-memory stores.

use std::net::SocketAddr;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

use tradepost_auth::{JwtClaims, Role};
use tradepost_core::UserId;

const SECRET: &str = "black-box-test-secret";

struct TestServer {
    addr: SocketAddr,
    client: reqwest::Client,
}

impl TestServer {
    async fn spawn() -> Self {
        let app = tradepost_api::app::build_app(SECRET.to_string()).await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            addr,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    async fn get(&self, path: &str, token: &str) -> (u16, Value) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }

    async fn put(&self, path: &str, token: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }
}

fn mint_token(user_id: UserId, role: Role) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user_id,
        role,
        issued_at: now - Duration::minutes(1),
        expires_at: now + Duration::hours(1),
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn register(server: &TestServer, token: &str, country: &str) {
    let (status, body) = server
        .post(
            "/users",
            token,
            json!({
                "email": "someone@example.com",
                "display_name": "Someone",
                "company_name": "Someco",
                "country": country,
            }),
        )
        .await;
    assert_eq!(status, 201, "register failed: {body}");
}

async fn create_seller_plan(server: &TestServer, admin: &str, limit: i64) {
    let (status, body) = server
        .post(
            "/admin/plans",
            admin,
            json!({
                "kind": "seller",
                "name": "Seller Free",
                "price_minor": 0,
                "currency": "USD",
                "limit": limit,
                "period_days": 30,
            }),
        )
        .await;
    assert_eq!(status, 201, "plan creation failed: {body}");
}

fn sample_product() -> Value {
    json!({
        "category_id": uuid::Uuid::now_v7(),
        "name": "Industrial bearing",
        "description": "Sealed units, bulk",
        "price": { "amount_minor": 2_500, "currency": "USD" },
        "stock": 500,
        "lead_time_days": 7,
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn requests_without_valid_token_are_unauthorized() {
    let server = TestServer::spawn().await;

    let resp = reqwest::get(server.url("/products")).await.unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    let (status, _) = server.get("/products", "not-a-jwt").await;
    assert_eq!(status, 401);

    // Health stays open.
    let resp = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn whoami_reflects_token_claims() {
    let server = TestServer::spawn().await;
    let user_id = UserId::new();
    let token = mint_token(user_id, Role::Seller);

    let (status, body) = server.get("/whoami", &token).await;
    assert_eq!(status, 200);
    assert_eq!(body["user_id"], json!(user_id));
    assert_eq!(body["role"], json!("seller"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn listing_moderation_lifecycle() {
    let server = TestServer::spawn().await;
    let admin = mint_token(UserId::new(), Role::Admin);
    let seller = mint_token(UserId::new(), Role::Seller);
    let buyer = mint_token(UserId::new(), Role::Buyer);

    create_seller_plan(&server, &admin, -1).await;
    register(&server, &seller, "DE").await;

    let (status, body) = server.post("/products", &seller, sample_product()).await;
    assert_eq!(status, 201, "create failed: {body}");
    assert_eq!(body["product"]["status"], "pending");
    let product_id = body["product"]["id"].as_str().unwrap().to_string();

    // Unapproved listings are invisible to buyers, indistinguishable from absent.
    let (status, _) = server.get(&format!("/products/{product_id}"), &buyer).await;
    assert_eq!(status, 404);

    let (_, body) = server.get("/admin/products/pending", &admin).await;
    assert_eq!(body["products"].as_array().unwrap().len(), 1);

    // Moderation is admin-only.
    let (status, body) = server
        .post(
            &format!("/admin/products/{product_id}/decision"),
            &seller,
            json!({ "action": "approve" }),
        )
        .await;
    assert_eq!(status, 403, "non-admin decision: {body}");
    assert_eq!(body["error"], "unauthorized");

    let (status, body) = server
        .post(
            &format!("/admin/products/{product_id}/decision"),
            &admin,
            json!({ "action": "approve" }),
        )
        .await;
    assert_eq!(status, 200, "approve failed: {body}");
    assert_eq!(body["product"]["status"], "approved");

    // Now buyers can see it.
    let (status, body) = server.get(&format!("/products/{product_id}"), &buyer).await;
    assert_eq!(status, 200);
    assert_eq!(body["product"]["status"], "approved");

    // A second decision on the same submission is rejected.
    let (status, body) = server
        .post(
            &format!("/admin/products/{product_id}/decision"),
            &admin,
            json!({ "action": "approve" }),
        )
        .await;
    assert_eq!(status, 409, "double decision: {body}");
    assert_eq!(body["error"], "invalid_state");

    // Live-editable fields keep the listing approved.
    let (status, body) = server
        .put(
            &format!("/products/{product_id}"),
            &seller,
            json!({ "price": { "amount_minor": 2_800, "currency": "USD" }, "stock": 450 }),
        )
        .await;
    assert_eq!(status, 200, "allow-listed edit: {body}");
    assert_eq!(body["product"]["status"], "approved");

    // A guarded field resets to pending and hides the listing again.
    let (status, body) = server
        .put(
            &format!("/products/{product_id}"),
            &seller,
            json!({ "name": "Ceramic bearing" }),
        )
        .await;
    assert_eq!(status, 200, "guarded edit: {body}");
    assert_eq!(body["product"]["status"], "pending");

    let (status, _) = server.get(&format!("/products/{product_id}"), &buyer).await;
    assert_eq!(status, 404);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rejection_requires_reason_and_carries_it_verbatim() {
    let server = TestServer::spawn().await;
    let admin = mint_token(UserId::new(), Role::Admin);
    let seller = mint_token(UserId::new(), Role::Seller);

    create_seller_plan(&server, &admin, -1).await;
    register(&server, &seller, "DE").await;

    let (_, body) = server.post("/products", &seller, sample_product()).await;
    let product_id = body["product"]["id"].as_str().unwrap().to_string();

    let (status, body) = server
        .post(
            &format!("/admin/products/{product_id}/decision"),
            &admin,
            json!({ "action": "reject" }),
        )
        .await;
    assert_eq!(status, 400, "reason-less reject: {body}");
    assert_eq!(body["error"], "validation_error");

    let (status, body) = server
        .post(
            &format!("/admin/products/{product_id}/decision"),
            &admin,
            json!({ "action": "reject", "reason": "spec sheet missing  " }),
        )
        .await;
    assert_eq!(status, 200);
    // Reason is stored untrimmed and echoed verbatim.
    assert_eq!(body["product"]["rejection_reason"], "spec sheet missing  ");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn listing_creation_is_entitlement_gated() {
    let server = TestServer::spawn().await;
    let admin = mint_token(UserId::new(), Role::Admin);
    let seller = mint_token(UserId::new(), Role::Seller);

    register(&server, &seller, "DE").await;

    // No plans configured at all: creation fails closed.
    let (status, body) = server.post("/products", &seller, sample_product()).await;
    assert_eq!(status, 400, "expected fail-closed denial: {body}");
    assert_eq!(body["error"], "validation_error");

    create_seller_plan(&server, &admin, 1).await;

    let (status, _) = server.post("/products", &seller, sample_product()).await;
    assert_eq!(status, 201);

    // Free tier allows one non-rejected listing; the second is denied.
    let (status, body) = server.post("/products", &seller, sample_product()).await;
    assert_eq!(status, 400, "expected limit denial: {body}");
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn verification_field_uniqueness_is_country_scoped() {
    let server = TestServer::spawn().await;
    let first = mint_token(UserId::new(), Role::Seller);
    let second = mint_token(UserId::new(), Role::Seller);
    let third = mint_token(UserId::new(), Role::Seller);

    register(&server, &first, "DE").await;
    register(&server, &second, "DE").await;
    register(&server, &third, "FR").await;

    let (status, _) = server
        .put(
            "/users/me",
            &first,
            json!({ "verification_details": { "tax_id": "DE-123" } }),
        )
        .await;
    assert_eq!(status, 200);

    // Same value, same country: conflict.
    let (status, body) = server
        .put(
            "/users/me",
            &second,
            json!({ "verification_details": { "tax_id": "DE-123" } }),
        )
        .await;
    assert_eq!(status, 409, "expected duplicate: {body}");
    assert_eq!(body["error"], "duplicate_field");

    // Same value, different country: fine.
    let (status, _) = server
        .put(
            "/users/me",
            &third,
            json!({ "verification_details": { "tax_id": "DE-123" } }),
        )
        .await;
    assert_eq!(status, 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn verification_review_and_reverification_trigger() {
    let server = TestServer::spawn().await;
    let admin = mint_token(UserId::new(), Role::Admin);
    let seller = mint_token(UserId::new(), Role::Seller);

    register(&server, &seller, "DE").await;

    let (status, body) = server
        .post(
            "/users/me/verification",
            &seller,
            json!({ "documents": { "registration": "https://docs.example/reg.pdf" } }),
        )
        .await;
    assert_eq!(status, 200, "submit documents: {body}");
    assert_eq!(body["user"]["verification_status"], "pending");

    let (_, body) = server.get("/admin/verifications/pending", &admin).await;
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
    let user_id = body["users"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = server
        .post(
            &format!("/admin/users/{user_id}/verification-decision"),
            &admin,
            json!({ "action": "approve" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["user"]["verification_status"], "verified");

    // Changing a vetted field puts the account back under review.
    let (status, body) = server
        .put("/users/me", &seller, json!({ "company_name": "Renamed GmbH" }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["user"]["verification_status"], "pending");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn free_plan_subscription_activates_immediately() {
    let server = TestServer::spawn().await;
    let admin = mint_token(UserId::new(), Role::Admin);
    let buyer = mint_token(UserId::new(), Role::Buyer);

    register(&server, &buyer, "DE").await;

    let (status, body) = server
        .post(
            "/admin/plans",
            &admin,
            json!({
                "kind": "buyer",
                "name": "Buyer Free",
                "price_minor": 0,
                "currency": "USD",
                "limit": 3,
                "period_days": 30,
            }),
        )
        .await;
    assert_eq!(status, 201);
    let plan_id = body["plan"]["id"].as_str().unwrap().to_string();

    let (status, body) = server
        .post("/billing/subscribe", &buyer, json!({ "plan_id": plan_id }))
        .await;
    assert_eq!(status, 200, "subscribe: {body}");
    assert_eq!(body["payment_required"], false);
    assert_eq!(body["user"]["subscription"]["active"], true);

    let (status, body) = server.post("/billing/cancel-renewal", &buyer, json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(body["user"]["subscription"]["renewal_cancelled"], true);
    // Cancelling renewal does not end the current period.
    assert_eq!(body["user"]["subscription"]["active"], true);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn paid_plan_goes_through_the_gateway() {
    let server = TestServer::spawn().await;
    let admin = mint_token(UserId::new(), Role::Admin);
    let seller = mint_token(UserId::new(), Role::Seller);

    register(&server, &seller, "IN").await;

    let (status, body) = server
        .post(
            "/admin/plans",
            &admin,
            json!({
                "kind": "seller",
                "name": "Seller Pro",
                "price_minor": 9_900,
                "currency": "USD",
                "limit": -1,
                "period_days": 30,
                "regional_prices": { "IN": 4_900 },
            }),
        )
        .await;
    assert_eq!(status, 201);
    let plan_id = body["plan"]["id"].as_str().unwrap().to_string();

    let (status, body) = server
        .post("/billing/subscribe", &seller, json!({ "plan_id": plan_id }))
        .await;
    assert_eq!(status, 200, "subscribe: {body}");
    assert_eq!(body["payment_required"], true);
    // Regional price applies to the caller's country.
    assert_eq!(body["order"]["amount_minor"], 4_900);
    let order_id = body["order"]["order_id"].as_str().unwrap().to_string();

    // Bad signature is refused.
    let (status, body) = server
        .post(
            "/billing/confirm",
            &seller,
            json!({
                "plan_id": plan_id,
                "order_id": order_id,
                "payment_id": "pay_1",
                "signature": "sig:tampered",
            }),
        )
        .await;
    assert_ne!(status, 200, "tampered receipt accepted: {body}");

    let signature = tradepost_billing::FakeGateway::signature_for(&order_id, "pay_1");
    let (status, body) = server
        .post(
            "/billing/confirm",
            &seller,
            json!({
                "plan_id": plan_id,
                "order_id": order_id,
                "payment_id": "pay_1",
                "signature": signature,
            }),
        )
        .await;
    assert_eq!(status, 200, "confirm: {body}");
    assert_eq!(body["user"]["subscription"]["active"], true);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn category_hierarchy_paths_and_subtrees() {
    let server = TestServer::spawn().await;
    let admin = mint_token(UserId::new(), Role::Admin);
    let buyer = mint_token(UserId::new(), Role::Buyer);

    // Category administration is admin-only.
    let (status, _) = server
        .post("/admin/categories", &buyer, json!({ "name": "Machinery" }))
        .await;
    assert_eq!(status, 403);

    let (status, body) = server
        .post("/admin/categories", &admin, json!({ "name": "Machinery" }))
        .await;
    assert_eq!(status, 201);
    let root = body["category"]["id"].as_str().unwrap().to_string();

    let (_, body) = server
        .post(
            "/admin/categories",
            &admin,
            json!({ "parent_id": root, "name": "Pumps" }),
        )
        .await;
    let pumps = body["category"]["id"].as_str().unwrap().to_string();

    let (_, body) = server
        .post(
            "/admin/categories",
            &admin,
            json!({ "parent_id": pumps, "name": "Hydraulic" }),
        )
        .await;
    let hydraulic = body["category"]["id"].as_str().unwrap().to_string();

    // An unknown parent is refused.
    let (status, body) = server
        .post(
            "/admin/categories",
            &admin,
            json!({ "parent_id": uuid::Uuid::now_v7(), "name": "Orphan" }),
        )
        .await;
    assert_eq!(status, 400, "dangling parent: {body}");

    let (status, body) = server
        .get(&format!("/categories/{hydraulic}/path"), &buyer)
        .await;
    assert_eq!(status, 200);
    let names: Vec<&str> = body["path"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Machinery", "Pumps", "Hydraulic"]);

    let (status, body) = server
        .get(&format!("/categories/{root}/descendants"), &buyer)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["categories"].as_array().unwrap().len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn admins_can_update_plans() {
    let server = TestServer::spawn().await;
    let admin = mint_token(UserId::new(), Role::Admin);

    let (status, body) = server
        .post(
            "/admin/plans",
            &admin,
            json!({
                "kind": "seller",
                "name": "Seller Basic",
                "price_minor": 0,
                "currency": "USD",
                "limit": 5,
                "period_days": 30,
            }),
        )
        .await;
    assert_eq!(status, 201);
    let plan_id = body["plan"]["id"].as_str().unwrap().to_string();

    let (status, body) = server
        .put(
            &format!("/admin/plans/{plan_id}"),
            &admin,
            json!({ "name": "Seller Basic v2", "limit": 10 }),
        )
        .await;
    assert_eq!(status, 200, "plan update: {body}");
    assert_eq!(body["plan"]["name"], "Seller Basic v2");
    assert_eq!(body["plan"]["limit"], 10);

    let (status, body) = server
        .put(
            &format!("/admin/plans/{plan_id}"),
            &admin,
            json!({ "period_days": 0 }),
        )
        .await;
    assert_eq!(status, 400, "invalid period accepted: {body}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sourcing_request_lifecycle() {
    let server = TestServer::spawn().await;
    let admin = mint_token(UserId::new(), Role::Admin);
    let buyer = mint_token(UserId::new(), Role::Buyer);

    register(&server, &buyer, "DE").await;
    let (status, _) = server
        .post(
            "/admin/plans",
            &admin,
            json!({
                "kind": "buyer",
                "name": "Buyer Free",
                "price_minor": 0,
                "currency": "USD",
                "limit": -1,
                "period_days": 30,
            }),
        )
        .await;
    assert_eq!(status, 201);

    let (status, body) = server
        .post(
            "/requests",
            &buyer,
            json!({
                "category_id": uuid::Uuid::now_v7(),
                "title": "Need 10k M8 bolts",
                "details": "Zinc plated, DIN 933",
                "quantity": 10_000,
                "target_price": { "amount_minor": 12, "currency": "USD" },
                "expires_at": Utc::now() + Duration::days(14),
            }),
        )
        .await;
    assert_eq!(status, 201, "create request: {body}");
    assert_eq!(body["request"]["status"], "pending");
    let request_id = body["request"]["id"].as_str().unwrap().to_string();

    let (status, body) = server
        .post(
            &format!("/admin/requests/{request_id}/decision"),
            &admin,
            json!({ "action": "reject", "reason": "quantity implausible" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["request"]["status"], "rejected");
    assert_eq!(body["request"]["rejection_reason"], "quantity implausible");

    // Owner still sees their rejected request, with the reason attached.
    let (status, body) = server.get(&format!("/requests/{request_id}"), &buyer).await;
    assert_eq!(status, 200);
    assert_eq!(body["request"]["rejection_reason"], "quantity implausible");

    // Reworking the details resubmits for review; quantity and target price
    // alone would not.
    let (status, body) = server
        .put(
            &format!("/requests/{request_id}"),
            &buyer,
            json!({ "details": "Zinc plated, DIN 933, staged deliveries", "quantity": 1_000 }),
        )
        .await;
    assert_eq!(status, 200, "edit after reject: {body}");
    assert_eq!(body["request"]["status"], "pending");
}

//! End-to-end tests through the HTTP boundary: the real router over the
//! in-memory store, driven with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use panel_ledger::handlers::{AppState, router};
use panel_ledger::store::MemoryStore;

fn app() -> Router {
    router(AppState::new(Arc::new(MemoryStore::new())))
}

/// Fire one request and decode the JSON body.
async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request builds");

    let response = app.clone().oneshot(request).await.expect("request is served");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_endpoints_respond() {
    let app = app();

    let (status, body) = send(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["store"], json!("connected"));
}

#[tokio::test]
async fn full_panel_flow_over_http() {
    let app = app();

    // Create the user.
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/users",
        Some(json!({ "id": "u1", "email": "u1@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["user"]["balance_cents"], json!(0));

    // Pick a username.
    let (status, body) = send(
        &app,
        "PUT",
        "/api/v1/users/u1/username",
        Some(json!({ "username": "alpha" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], json!("alpha"));

    // Fund the account.
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/users/u1/balance",
        Some(json!({ "action": "add", "amount_cents": 50_000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance_cents"], json!(50_000));

    // Place an order.
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/orders",
        Some(json!({
            "user_id": "u1",
            "service": "Instagram Followers",
            "service_id": "instagram_followers",
            "platform": "Instagram",
            "plan": "normal",
            "target": "someaccount",
            "utr": "TXN123456",
            "amount_cents": 8000,
            "quantity": 1000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], json!("pending"));
    assert_eq!(body["order"]["username"], json!("alpha"));
    let order_id = body["order"]["id"].as_str().expect("order id").to_string();

    // Balance reflects the debit.
    let (status, body) = send(&app, "GET", "/api/v1/users/u1/balance", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance_cents"], json!(42_000));

    // Operator completes the order.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/v1/orders/{order_id}/status"),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/api/v1/orders?status=completed", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orders"].as_array().map(Vec::len), Some(1));

    // The dashboard rollup sees all of it.
    let (status, body) = send(&app, "GET", "/api/v1/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orders"]["total_orders"], json!(1));
    assert_eq!(body["orders"]["completed_orders"], json!(1));
    assert_eq!(body["orders"]["total_revenue_cents"], json!(8000));
    assert_eq!(body["users"]["total_users"], json!(1));
    assert_eq!(body["users"]["total_balance_cents"], json!(42_000));
}

#[tokio::test]
async fn missing_user_maps_to_404_envelope() {
    let app = app();

    let (status, body) = send(&app, "GET", "/api/v1/users/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("user not found"));
}

#[tokio::test]
async fn business_rule_failures_map_to_400_envelope() {
    let app = app();

    send(
        &app,
        "POST",
        "/api/v1/users",
        Some(json!({ "id": "u1", "email": "u1@example.com" })),
    )
    .await;

    // Deduct from an empty balance.
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/users/u1/balance",
        Some(json!({ "action": "deduct", "amount_cents": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("insufficient balance"));

    // Negative amounts are invalid for every action.
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/users/u1/balance",
        Some(json!({ "action": "add", "amount_cents": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    // Second username assignment loses.
    send(
        &app,
        "PUT",
        "/api/v1/users/u1/username",
        Some(json!({ "username": "alpha" })),
    )
    .await;
    let (status, body) = send(
        &app,
        "PUT",
        "/api/v1/users/u1/username",
        Some(json!({ "username": "beta" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("username already set"));
}

#[tokio::test]
async fn admin_delete_is_destructive_and_final() {
    let app = app();

    send(
        &app,
        "POST",
        "/api/v1/users",
        Some(json!({ "id": "u1", "email": "u1@example.com" })),
    )
    .await;

    let (status, _) = send(&app, "DELETE", "/api/v1/admin/users/u1", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/api/v1/users/u1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", "/api/v1/admin/users/u1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

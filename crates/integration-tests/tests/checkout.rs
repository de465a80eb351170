//! Checkout against an injected payment gateway.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use serde_json::{Value, json};

use autocatalog_core::{ProductId, Role};
use autocatalog_integration_tests::{TestApp, json_body};
use autocatalog_storefront::services::SimulatedGateway;

fn basket(lines: &[(&ProductId, f64, u32)], method: &str) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .map(|(id, price, quantity)| {
            json!({ "id": id, "name": format!("Manual {id}"), "price": price, "quantity": quantity })
        })
        .collect();
    json!({
        "items": items,
        "paymentMethod": method,
        "customerInfo": { "email": "buyer@example.com", "firstName": "Ada", "lastName": "Lovelace" }
    })
}

#[tokio::test]
async fn test_signed_in_checkout_records_order() {
    let app = TestApp::spawn().await;
    let bmw = app.category("bmw").await;
    let etk = app.product("etk", &bmw, 49.99).await;
    let wiring = app.product("wiring", &bmw, 19.99).await;
    app.login_as(Role::User).await;

    let (status, body) = json_body(
        app.post_json(
            "/api/checkout",
            &basket(&[(&etk, 49.99, 1), (&wiring, 19.99, 2)], "paypal"),
        )
        .await,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Order completed successfully");
    assert!(body["orderId"].as_str().unwrap().starts_with("ORD-"));
    assert!(body["transactionId"].as_str().unwrap().starts_with("pp_"));

    let links = body["downloadLinks"].as_array().unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(
        links[0]["downloadUrl"],
        app.url(&format!("/downloads/{etk}"))
    );

    let (status, orders) = json_body(app.get("/api/user/orders").await).await;
    assert_eq!(status, 200);
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], body["orderId"]);
    assert_eq!(orders[0]["status"], "COMPLETED");
    assert_eq!(orders[0]["amount"], "$89.97");
    assert_eq!(orders[0]["product"], format!("Manual {etk} + 1 more"));
}

#[tokio::test]
async fn test_anonymous_checkout_is_charged_but_not_recorded() {
    let app = TestApp::spawn().await;
    let bmw = app.category("bmw").await;
    let etk = app.product("etk", &bmw, 49.99).await;

    let (status, body) =
        json_body(app.post_json("/api/checkout", &basket(&[(&etk, 49.99, 1)], "visa")).await).await;
    assert_eq!(status, 200);
    assert!(body["transactionId"].as_str().unwrap().starts_with("txn_"));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customer_order")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_declined_payment() {
    let app = TestApp::spawn_with_gateway(Arc::new(SimulatedGateway::new().decline_above(100.0))).await;
    let bmw = app.category("bmw").await;
    let etk = app.product("etk", &bmw, 49.99).await;
    app.login_as(Role::User).await;

    let (status, body) =
        json_body(app.post_json("/api/checkout", &basket(&[(&etk, 49.99, 3)], "visa")).await).await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({ "success": false, "message": "Payment failed" }));

    let (_, orders) = json_body(app.get("/api/user/orders").await).await;
    assert_eq!(orders, json!([]));

    // Under the ceiling the same gateway approves.
    let resp = app
        .post_json("/api/checkout", &basket(&[(&etk, 49.99, 1)], "visa"))
        .await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_checkout_validation() {
    let app = TestApp::spawn().await;
    let bmw = app.category("bmw").await;
    let etk = app.product("etk", &bmw, 49.99).await;

    let (status, body) =
        json_body(app.post_json("/api/checkout", &basket(&[], "visa")).await).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Cart is empty");

    let (status, body) = json_body(
        app.post_json("/api/checkout", &basket(&[(&etk, 49.99, 1)], "cheque"))
            .await,
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Unsupported payment method");
}

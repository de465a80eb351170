//! Server cart mirror: every sync replaces the stored cart.

#![allow(clippy::unwrap_used)]

use serde_json::json;

use autocatalog_core::Role;
use autocatalog_integration_tests::{TestApp, json_body};

#[tokio::test]
async fn test_anonymous_cart_is_empty_and_sync_needs_session() {
    let app = TestApp::spawn().await;

    let (status, body) = json_body(app.get("/api/cart").await).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!([]));

    let (status, body) =
        json_body(app.post_json("/api/cart/sync", &json!({ "items": [] })).await).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "Authentication required");
}

#[tokio::test]
async fn test_sync_replaces_whole_cart() {
    let app = TestApp::spawn().await;
    let bmw = app.category("bmw").await;
    let etk = app.product("etk", &bmw, 49.99).await;
    let wiring = app.product("wiring", &bmw, 19.99).await;
    app.login_as(Role::User).await;

    let (status, body) = json_body(
        app.post_json(
            "/api/cart/sync",
            &json!({ "items": [
                { "productId": etk, "quantity": 1 },
                { "productId": wiring, "quantity": 2 }
            ]}),
        )
        .await,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "success": true }));

    let (_, cart) = json_body(app.get("/api/cart").await).await;
    assert_eq!(cart.as_array().unwrap().len(), 2);

    // A later sync without `etk` drops it.
    app.post_json(
        "/api/cart/sync",
        &json!({ "items": [{ "productId": wiring, "quantity": 3 }] }),
    )
    .await;

    let (_, cart) = json_body(app.get("/api/cart").await).await;
    let cart = cart.as_array().unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0]["id"], wiring.as_str());
    assert_eq!(cart[0]["quantity"], 3);

    // An empty sync clears it.
    app.post_json("/api/cart/sync", &json!({ "items": [] })).await;
    let (_, cart) = json_body(app.get("/api/cart").await).await;
    assert_eq!(cart, json!([]));
}

#[tokio::test]
async fn test_sync_merges_duplicate_products() {
    let app = TestApp::spawn().await;
    let bmw = app.category("bmw").await;
    let etk = app.product("etk", &bmw, 49.99).await;
    app.login_as(Role::User).await;

    app.post_json(
        "/api/cart/sync",
        &json!({ "items": [
            { "productId": etk, "quantity": 1 },
            { "productId": etk, "quantity": 2 }
        ]}),
    )
    .await;

    let (_, cart) = json_body(app.get("/api/cart").await).await;
    assert_eq!(cart[0]["quantity"], 3);
    assert_eq!(cart.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_sync_rejects_bad_entries_and_keeps_previous_cart() {
    let app = TestApp::spawn().await;
    let bmw = app.category("bmw").await;
    let etk = app.product("etk", &bmw, 49.99).await;
    app.login_as(Role::User).await;

    app.post_json(
        "/api/cart/sync",
        &json!({ "items": [{ "productId": etk, "quantity": 1 }] }),
    )
    .await;

    let (status, body) = json_body(
        app.post_json(
            "/api/cart/sync",
            &json!({ "items": [{ "productId": etk, "quantity": 0 }] }),
        )
        .await,
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Quantity must be at least 1");

    let (status, _) = json_body(
        app.post_json(
            "/api/cart/sync",
            &json!({ "items": [{ "productId": "gone", "quantity": 1 }] }),
        )
        .await,
    )
    .await;
    assert_eq!(status, 400);

    let (_, cart) = json_body(app.get("/api/cart").await).await;
    assert_eq!(cart[0]["id"], etk.as_str());
    assert_eq!(cart[0]["quantity"], 1);
}

#[tokio::test]
async fn test_carts_are_per_user() {
    let app = TestApp::spawn().await;
    let bmw = app.category("bmw").await;
    let etk = app.product("etk", &bmw, 49.99).await;
    app.login_as(Role::User).await;
    app.post_json(
        "/api/cart/sync",
        &json!({ "items": [{ "productId": etk, "quantity": 1 }] }),
    )
    .await;

    let other = app.other_client();
    app.create_user("other@example.com", Role::User).await;
    app.login_with(&other, "other@example.com", autocatalog_integration_tests::PASSWORD)
        .await;
    let cart: serde_json::Value = other
        .get(app.url("/api/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart, json!([]));
}

#[tokio::test]
async fn test_sync_quantity_must_fit_a_cart_line() {
    let app = TestApp::spawn().await;
    let bmw = app.category("bmw").await;
    let etk = app.product("etk", &bmw, 49.99).await;
    app.login_as(Role::User).await;

    let (status, body) = json_body(
        app.post_json(
            "/api/cart/sync",
            &json!({ "items": [{ "productId": etk, "quantity": 5_000_000_000_i64 }] }),
        )
        .await,
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Quantity is too large");

    let (status, cart) = json_body(app.get("/api/cart").await).await;
    assert_eq!(status, 200);
    assert_eq!(cart, json!([]));

    // Duplicates that together overflow a line are capped, and the cart
    // stays readable.
    let max = u32::MAX;
    let (status, _) = json_body(
        app.post_json(
            "/api/cart/sync",
            &json!({ "items": [
                { "productId": etk, "quantity": max },
                { "productId": etk, "quantity": max }
            ]}),
        )
        .await,
    )
    .await;
    assert_eq!(status, 200);

    let (status, cart) = json_body(app.get("/api/cart").await).await;
    assert_eq!(status, 200);
    assert_eq!(cart[0]["quantity"], max);
}

//! The client cart stores mirrored to a running storefront over HTTP.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use autocatalog_client::{
    CartMirror, CartStore, ClientConfig, ClientError, HttpCartMirror, MemoryStorage, ProductRef,
};
use autocatalog_core::{ProductId, Role};
use autocatalog_integration_tests::{PASSWORD, TestApp};

fn mirror(app: &TestApp) -> Arc<HttpCartMirror> {
    let config = ClientConfig::new(app.url(""), "unused");
    Arc::new(HttpCartMirror::new(&config).unwrap())
}

fn manual(id: &ProductId, slug: &str, price: f64) -> ProductRef {
    ProductRef::new(id.clone(), format!("Manual {slug}"), price)
}

#[tokio::test]
async fn test_anonymous_mirror_is_rejected() {
    let app = TestApp::spawn().await;
    let bmw = app.category("bmw").await;
    let etk = app.product("etk", &bmw, 49.99).await;
    let mirror = mirror(&app);

    let err = mirror.push(Vec::new()).await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));
    assert!(mirror.fetch().await.unwrap().is_empty());

    let err = mirror.login("nobody@example.com", PASSWORD).await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));

    // A rejected background sync leaves the local cart alone.
    let mut cart = CartStore::open(Arc::new(MemoryStorage::new())).with_mirror(mirror);
    cart.add_item(manual(&etk, "etk", 49.99));
    cart.flush().await;
    assert_eq!(cart.items().len(), 1);
}

#[tokio::test]
async fn test_signed_in_cart_round_trips_through_server() {
    let app = TestApp::spawn().await;
    let bmw = app.category("bmw").await;
    let etk = app.product("etk", &bmw, 49.99).await;
    let wiring = app.product("wiring", &bmw, 19.99).await;
    let isid = app.product("isid", &bmw, 120.0).await;
    app.create_user("driver@example.com", Role::User).await;

    let mirror = mirror(&app);
    mirror.login("driver@example.com", PASSWORD).await.unwrap();

    let mut cart = CartStore::open(Arc::new(MemoryStorage::new())).with_mirror(mirror.clone());
    cart.add_item(manual(&etk, "etk", 49.99));
    cart.add_item(manual(&wiring, "wiring", 19.99));
    cart.add_item(manual(&etk, "etk", 49.99));
    cart.add_item(manual(&isid, "isid", 120.0));
    cart.update_quantity(&wiring, 4);
    cart.remove_item(&isid);
    cart.flush().await;

    let remote = mirror.fetch().await.unwrap();
    assert_eq!(remote, cart.items());

    // Another device with an empty local cart picks up the server copy.
    let mut fresh = CartStore::open(Arc::new(MemoryStorage::new())).with_mirror(mirror);
    assert!(fresh.items().is_empty());
    fresh.load_from_server().await.unwrap();

    assert_eq!(fresh.items(), cart.items());
    assert_eq!(fresh.total_items(), 6);
    let quantities: Vec<(&str, u32)> = fresh
        .items()
        .iter()
        .map(|item| (item.id.as_str(), item.quantity))
        .collect();
    assert_eq!(quantities, vec![(etk.as_str(), 2), (wiring.as_str(), 4)]);
}

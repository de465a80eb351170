//! Category and product management through the admin API, and what the
//! public catalog shows afterwards.

#![allow(clippy::unwrap_used)]

use serde_json::json;

use autocatalog_core::Role;
use autocatalog_integration_tests::{TestApp, json_body};

#[tokio::test]
async fn test_category_with_products_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    let bmw = app.category("bmw").await;
    let manual = app.product("e90-manual", &bmw, 20.0).await;
    app.login_as(Role::Admin).await;

    let (status, body) = json_body(app.delete(&format!("/api/admin/categories/{bmw}")).await).await;
    assert_eq!(status, 400);
    assert_eq!(
        body["error"],
        "Cannot delete category with products. Move or delete products first."
    );

    // Once the product is gone the category can go too.
    let (status, body) =
        json_body(app.delete(&format!("/api/admin/products/{manual}")).await).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "message": "Product deleted successfully" }));

    let (status, body) = json_body(app.delete(&format!("/api/admin/categories/{bmw}")).await).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "message": "Category deleted successfully" }));
}

#[tokio::test]
async fn test_category_with_children_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    let bmw = app.category("bmw").await;
    let series = app.child_category("bmw-3-series", Some(&bmw)).await;
    app.login_as(Role::Admin).await;

    let (status, body) = json_body(app.delete(&format!("/api/admin/categories/{bmw}")).await).await;
    assert_eq!(status, 400);
    assert_eq!(
        body["error"],
        "Cannot delete category with subcategories. Delete subcategories first."
    );

    // The leaf goes first, then the parent.
    let (status, body) =
        json_body(app.delete(&format!("/api/admin/categories/{series}")).await).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "message": "Category deleted successfully" }));

    let resp = app.delete(&format!("/api/admin/categories/{bmw}")).await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_missing_category_is_not_found() {
    let app = TestApp::spawn().await;
    app.login_as(Role::Admin).await;

    let (status, body) = json_body(app.delete("/api/admin/categories/nope").await).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Category not found");
}

#[tokio::test]
async fn test_category_create_requires_name_and_slug() {
    let app = TestApp::spawn().await;
    app.login_as(Role::Admin).await;

    let (status, body) =
        json_body(app.post_json("/api/admin/categories", &json!({ "name": "Audi" })).await).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Name and slug are required");

    let (status, body) = json_body(
        app.post_json(
            "/api/admin/categories",
            &json!({ "name": "Audi", "slug": "audi", "parentId": "" }),
        )
        .await,
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(body["slug"], "audi");
    assert_eq!(body["parentId"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_product_create_and_duplicate_slug() {
    let app = TestApp::spawn().await;
    let toyota = app.category("toyota").await;
    app.login_as(Role::Admin).await;

    let request = json!({
        "name": "Corolla Repair Manual",
        "slug": "corolla-repair-manual",
        "price": 17.99,
        "categoryId": toyota,
        "productType": "REPAIR_MANUAL",
        "make": "Toyota",
        "year": "2019-2024"
    });

    let (status, body) = json_body(app.post_json("/api/admin/products", &request).await).await;
    assert_eq!(status, 201);
    assert_eq!(body["slug"], "corolla-repair-manual");
    assert_eq!(body["make"], "Toyota");
    assert_eq!(body["isActive"], true);
    assert_eq!(body["category"]["id"], toyota.as_str());
    assert_eq!(body["category"]["slug"], "toyota");
    assert_eq!(body["category"]["name"], "TOYOTA");

    let (status, body) = json_body(app.post_json("/api/admin/products", &request).await).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Product slug must be unique");
}

#[tokio::test]
async fn test_product_create_requires_fields() {
    let app = TestApp::spawn().await;
    app.login_as(Role::Admin).await;

    let (status, body) = json_body(
        app.post_json("/api/admin/products", &json!({ "name": "Half a product" }))
            .await,
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(
        body["error"],
        "Name, slug, price, category, and product type are required"
    );
}

#[tokio::test]
async fn test_deactivated_product_leaves_public_catalog() {
    let app = TestApp::spawn().await;
    let bmw = app.category("bmw").await;
    let visible = app.product("visible", &bmw, 10.0).await;
    let hidden = app.product("hidden", &bmw, 12.0).await;
    app.login_as(Role::Admin).await;

    let resp = app
        .put_json(
            &format!("/api/admin/products/{hidden}"),
            &json!({ "isActive": false }),
        )
        .await;
    assert_eq!(resp.status(), 200);

    let public = app.other_client();
    let body: serde_json::Value = public
        .get(app.url("/api/products"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<&str> = body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![visible.as_str()]);
    assert_eq!(body["pagination"]["total"], 1);

    let resp = public
        .get(app.url(&format!("/api/products/{hidden}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Admins still see it.
    let (status, body) = json_body(app.get(&format!("/api/admin/products/{hidden}")).await).await;
    assert_eq!(status, 200);
    assert_eq!(body["isActive"], false);
}

#[tokio::test]
async fn test_public_category_counts_only_active_products() {
    let app = TestApp::spawn().await;
    let bmw = app.category("bmw").await;
    app.product("one", &bmw, 10.0).await;
    let two = app.product("two", &bmw, 10.0).await;
    sqlx::query("UPDATE product SET is_active = 0 WHERE id = ?")
        .bind(two.as_str())
        .execute(&app.pool)
        .await
        .unwrap();

    let (status, body) = json_body(app.get("/api/categories").await).await;
    assert_eq!(status, 200);
    assert_eq!(body[0]["slug"], "bmw");
    assert_eq!(body[0]["_count"]["products"], 1);
}

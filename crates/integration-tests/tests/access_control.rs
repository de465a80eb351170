//! Role gate over the admin API, the account API and the admin pages.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::json;

use autocatalog_core::Role;
use autocatalog_integration_tests::{TestApp, json_body, location};

// ============================================================================
// API gate
// ============================================================================

#[tokio::test]
async fn test_admin_api_requires_session() {
    let app = TestApp::spawn().await;

    for path in [
        "/api/admin/products",
        "/api/admin/categories",
        "/api/admin/users",
        "/api/admin/orders",
    ] {
        let (status, body) = json_body(app.get(path).await).await;
        assert_eq!(status, 401, "{path}");
        assert_eq!(body, json!({ "error": "Authentication required" }), "{path}");
    }
}

#[tokio::test]
async fn test_admin_api_rejects_plain_users() {
    let app = TestApp::spawn().await;
    app.login_as(Role::User).await;

    let (status, body) = json_body(app.get("/api/admin/products").await).await;
    assert_eq!(status, 403);
    assert_eq!(body, json!({ "error": "Insufficient permissions" }));

    // Writes are refused before the body is looked at.
    let resp = app
        .post_json("/api/admin/categories", &json!({ "name": "X", "slug": "x" }))
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_api_allows_admins() {
    let app = TestApp::spawn().await;
    app.login_as(Role::Admin).await;

    let (status, body) = json_body(app.get("/api/admin/products").await).await;
    assert_eq!(status, 200);
    assert_eq!(body["products"], json!([]));
    assert_eq!(body["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_account_deletion_is_super_admin_only() {
    let app = TestApp::spawn().await;
    let victim = app.create_user("victim@example.com", Role::User).await;
    app.login_as(Role::Admin).await;

    let path = format!("/api/admin/users/{}", victim.id);
    let (status, body) = json_body(app.delete(&path).await).await;
    assert_eq!(status, 403);
    assert_eq!(body, json!({ "error": "Insufficient permissions" }));

    let root = app.other_client();
    app.create_user("root@example.com", Role::SuperAdmin).await;
    let resp = app
        .login_with(&root, "root@example.com", autocatalog_integration_tests::PASSWORD)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = root.delete(app.url(&path)).send().await.unwrap();
    let (status, body) = json_body(resp).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "message": "User deleted successfully" }));
}

#[tokio::test]
async fn test_admin_cannot_grant_super_admin() {
    let app = TestApp::spawn().await;
    let target = app.create_user("target@example.com", Role::User).await;
    app.login_as(Role::Admin).await;

    let resp = app
        .patch_json(
            "/api/admin/users",
            &json!({ "userId": target.id, "role": "SUPER_ADMIN" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let (status, body) = json_body(
        app.patch_json(
            "/api/admin/users",
            &json!({ "userId": target.id, "role": "ADMIN" }),
        )
        .await,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["role"], "ADMIN");
}

#[tokio::test]
async fn test_account_api_requires_session() {
    let app = TestApp::spawn().await;

    for path in [
        "/api/user/wishlist",
        "/api/user/orders",
        "/api/user/stats",
        "/api/user/activity",
        "/api/user/profile",
    ] {
        let (status, body) = json_body(app.get(path).await).await;
        assert_eq!(status, 401, "{path}");
        assert_eq!(body["error"], "Authentication required", "{path}");
    }
}

// ============================================================================
// Page gate
// ============================================================================

#[tokio::test]
async fn test_admin_page_sends_visitors_to_signin() {
    let app = TestApp::spawn().await;

    let resp = app.get("/admin").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth/signin?callbackUrl=%2Fadmin");

    let resp = app.get("/admin/super").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth/signin?callbackUrl=%2Fadmin%2Fsuper");
}

#[tokio::test]
async fn test_admin_page_sends_users_to_forbidden() {
    let app = TestApp::spawn().await;
    app.login_as(Role::User).await;

    let resp = app.get("/admin").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/403");

    let resp = app.get("/403").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_super_page_sends_admins_back_to_panel() {
    let app = TestApp::spawn().await;
    app.login_as(Role::Admin).await;

    let resp = app.get("/admin").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.get("/admin/super").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/admin");
}

#[tokio::test]
async fn test_super_admin_sees_super_page() {
    let app = TestApp::spawn().await;
    app.login_as(Role::SuperAdmin).await;

    let resp = app.get("/admin/super").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("super_admin@example.com"));
}

#[tokio::test]
async fn test_admin_redirect_target() {
    let app = TestApp::spawn().await;

    let (_, body) = json_body(app.get("/api/auth/admin-redirect").await).await;
    assert_eq!(body, json!({ "redirect": "/auth/signin" }));

    app.login_as(Role::Admin).await;
    let (_, body) = json_body(app.get("/api/auth/admin-redirect").await).await;
    assert_eq!(body, json!({ "redirect": "/admin" }));
}

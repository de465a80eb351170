//! Registration, sign-in (API and form), session lookup and sign-out.

#![allow(clippy::unwrap_used)]

use reqwest::{StatusCode, header::CONTENT_TYPE};
use serde_json::{Value, json};

use autocatalog_core::Role;
use autocatalog_integration_tests::{PASSWORD, TestApp, json_body, location};

#[tokio::test]
async fn test_register_creates_plain_user() {
    let app = TestApp::spawn().await;

    let (status, body) = json_body(
        app.post_json(
            "/api/auth/register",
            &json!({ "name": "Grace", "email": "Grace@Example.com", "password": "hopper-1906" }),
        )
        .await,
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(body["email"], "grace@example.com");
    assert_eq!(body["role"], "USER");
    assert!(body.get("passwordHash").is_none());

    let (status, body) = json_body(
        app.post_json(
            "/api/auth/register",
            &json!({ "email": "grace@example.com", "password": "another-one" }),
        )
        .await,
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "An account with this email already exists");
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let app = TestApp::spawn().await;

    let resp = app
        .post_json(
            "/api/auth/register",
            &json!({ "email": "short@example.com", "password": "abc" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_session_logout() {
    let app = TestApp::spawn().await;
    app.create_user("ada@example.com", Role::User).await;

    let (_, session) = json_body(app.get("/api/auth/session").await).await;
    assert_eq!(session, Value::Null);

    let (status, body) = json_body(app.login_with(&app.client, "ada@example.com", "wrong-password").await).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = json_body(app.login_with(&app.client, "ada@example.com", PASSWORD).await).await;
    assert_eq!(status, 200);
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["role"], "USER");

    let (_, session) = json_body(app.get("/api/auth/session").await).await;
    assert_eq!(session["email"], "ada@example.com");

    let (status, body) = json_body(app.post_json("/api/auth/logout", &json!({})).await).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "success": true }));

    let (_, session) = json_body(app.get("/api/auth/session").await).await;
    assert_eq!(session, Value::Null);
}

#[tokio::test]
async fn test_profile_update_refreshes_session() {
    let app = TestApp::spawn().await;
    app.login_as(Role::User).await;

    let (status, body) = json_body(
        app.patch_json(
            "/api/user/profile",
            &json!({ "name": "Renamed", "email": "user@example.com" }),
        )
        .await,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Profile updated successfully");

    let (_, session) = json_body(app.get("/api/auth/session").await).await;
    assert_eq!(session["name"], "Renamed");
    assert_eq!(session["role"], "USER");

    let (status, body) = json_body(
        app.patch_json("/api/user/profile", &json!({ "name": "No Email" }))
            .await,
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Name and email are required");
}

// ============================================================================
// Sign-in page
// ============================================================================

async fn submit_signin(app: &TestApp, form: &str) -> reqwest::Response {
    app.client
        .post(app.url("/auth/signin"))
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(form.to_owned())
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_signin_page_carries_callback() {
    let app = TestApp::spawn().await;

    let resp = app.get("/auth/signin?callbackUrl=%2Fadmin").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains(r#"action="/auth/signin""#));
    assert!(html.contains(r#"value="/admin""#));
}

#[tokio::test]
async fn test_signin_form_follows_callback() {
    let app = TestApp::spawn().await;
    app.create_user("ops@example.com", Role::Admin).await;

    let resp = submit_signin(
        &app,
        "email=ops%40example.com&password=wrong-password&callbackUrl=%2Fadmin",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&resp),
        "/auth/signin?error=credentials&callbackUrl=%2Fadmin"
    );

    let form = format!("email=ops%40example.com&password={PASSWORD}&callbackUrl=%2Fadmin");
    let resp = submit_signin(&app, &form).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/admin");

    let resp = app.get("/admin").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_signin_form_ignores_offsite_callback() {
    let app = TestApp::spawn().await;
    app.create_user("ops@example.com", Role::Admin).await;

    let form = format!(
        "email=ops%40example.com&password={PASSWORD}&callbackUrl=%2F%2Fevil.example.com"
    );
    let resp = submit_signin(&app, &form).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
}

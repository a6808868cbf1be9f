//! Back-office router tests against a mocked REST backend.

#![allow(clippy::unwrap_used)]

use pawpal_integration_tests::wiremock::matchers::{method, path};
use pawpal_integration_tests::wiremock::{Mock, ResponseTemplate};
use pawpal_integration_tests::{location, mount_get, spawn_admin};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_pages_require_staff_session() {
    let app = spawn_admin().await;
    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_unread_api_returns_401_without_session() {
    let app = spawn_admin().await;
    let response = app.get("/api/notifications/unread").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_customer_cannot_sign_in() {
    let app = spawn_admin().await;
    let response = app.login_as("CUSTOMER").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("This account does not have back-office access")
    );
}

#[tokio::test]
async fn test_marketing_is_kept_out_of_user_analytics() {
    let app = spawn_admin().await;
    let response = app.login_as("MARKETING").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = app.get("/users").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let unread = app.get("/api/notifications/unread").await;
    assert_eq!(unread.status(), StatusCode::OK);
    let body: serde_json::Value = unread.json().await.unwrap();
    assert_eq!(body["unread"], 0);
}

#[tokio::test]
async fn test_dashboard_degrades_when_stats_fail() {
    let app = spawn_admin().await;
    app.login_as("ADMIN").await;
    Mock::given(method("GET"))
        .and(path("/products/dashboard"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.backend)
        .await;
    mount_get(
        &app.backend,
        "/users/dashboard",
        json!({ "totalUsers": 1200, "newUsersThisMonth": 35, "activeUsers": 410 }),
    )
    .await;

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Could not load product statistics."));
    assert!(body.contains("1200"));
}

#[tokio::test]
async fn test_disallowed_ticket_transition_is_not_sent() {
    let app = spawn_admin().await;
    app.login_as("MARKETING").await;
    mount_get(
        &app.backend,
        "/tickets/5",
        json!({
            "id": 5,
            "subject": "Wrong size harness",
            "message": "The harness is too small.",
            "customerName": "An",
            "customerEmail": "an@pawpal.vn",
            "status": "CLOSED",
            "createdAt": "2026-10-01T08:00:00Z"
        }),
    )
    .await;
    Mock::given(method("PATCH"))
        .and(path("/tickets/5"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.backend)
        .await;

    let response = app.post_form("/tickets/5", &[("status", "OPEN")]).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_expired_staff_token_redirects_to_login() {
    let app = spawn_admin().await;
    app.login_as("ADMIN").await;
    Mock::given(method("GET"))
        .and(path("/banners"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&app.backend)
        .await;

    let response = app.get("/banners").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?expired=1");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = spawn_admin().await;
    app.login_as("ADMIN").await;

    let response = app.post_form("/auth/logout", &[]).await;
    assert_eq!(location(&response), "/auth/login");
    assert_eq!(location(&app.get("/").await), "/auth/login");
}

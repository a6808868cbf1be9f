//! Storefront router tests against a mocked REST backend.

#![allow(clippy::unwrap_used)]

use pawpal_integration_tests::wiremock::matchers::{body_partial_json, header, method, path};
use pawpal_integration_tests::wiremock::{Mock, ResponseTemplate};
use pawpal_integration_tests::{envelope, location, mount_get, mount_login, spawn_storefront};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_health() {
    let app = spawn_storefront().await;
    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_homepage_renders_when_backend_is_down() {
    // No mocks: every catalog call gets a 404
    let app = spawn_storefront().await;
    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("PawPal"));
}

#[tokio::test]
async fn test_homepage_shows_best_sellers() {
    let app = spawn_storefront().await;
    mount_get(
        &app.backend,
        "/products/best-selling",
        json!([{ "id": 7, "name": "Salmon cat treats", "price": 45000, "sold": 120 }]),
    )
    .await;

    let body = app.get("/").await.text().await.unwrap();
    assert!(body.contains("Salmon cat treats"));
    assert!(body.contains("45,000₫"));
}

#[tokio::test]
async fn test_cart_requires_login() {
    let app = spawn_storefront().await;
    let response = app.get("/cart").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/auth/login?next="));
}

#[tokio::test]
async fn test_login_redirects_to_next() {
    let app = spawn_storefront().await;
    mount_login(&app.backend, "CUSTOMER").await;

    let response = app
        .post_form(
            "/auth/login",
            &[
                ("email", "an@pawpal.vn"),
                ("password", "hunter22"),
                ("next", "/wishlist"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/wishlist");
}

#[tokio::test]
async fn test_login_ignores_offsite_next() {
    let app = spawn_storefront().await;
    mount_login(&app.backend, "CUSTOMER").await;

    let response = app
        .post_form(
            "/auth/login",
            &[
                ("email", "an@pawpal.vn"),
                ("password", "hunter22"),
                ("next", "//evil.example"),
            ],
        )
        .await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_login_with_bad_credentials() {
    let app = spawn_storefront().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&app.backend)
        .await;

    let response = app
        .post_form("/auth/login", &[("email", "an@pawpal.vn"), ("password", "nope")])
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.text().await.unwrap().contains("Invalid email or password"));
}

#[tokio::test]
async fn test_expired_token_sends_customer_to_login() {
    let app = spawn_storefront().await;
    app.login_as("CUSTOMER").await;
    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&app.backend)
        .await;

    let response = app.get("/cart").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?expired=1");

    // The stale session is dropped, so the cart now asks for a fresh login
    let page = app.get("/auth/login?expired=1").await;
    assert!(page.text().await.unwrap().contains("Your session has expired"));
    let response = app.get("/cart").await;
    assert!(location(&response).starts_with("/auth/login?next="));
}

async fn mount_checkout_data(app: &pawpal_integration_tests::TestApp) {
    mount_get(
        &app.backend,
        "/cart",
        json!([{
            "id": 1, "productId": 7, "variantId": 70, "productName": "Salmon cat treats",
            "quantity": 2, "unitPrice": 45000
        }]),
    )
    .await;
    mount_get(
        &app.backend,
        "/users/addresses",
        json!([{
            "id": 5, "recipientName": "An", "phone": "0900000000", "street": "1 Le Loi",
            "district": "District 1", "city": "Ho Chi Minh City", "isDefault": true
        }]),
    )
    .await;
    mount_get(&app.backend, "/vouchers/user", json!([])).await;
}

#[tokio::test]
async fn test_cod_checkout_redirects_to_result() {
    let app = spawn_storefront().await;
    app.login_as("CUSTOMER").await;
    mount_checkout_data(&app).await;
    Mock::given(method("POST"))
        .and(path("/payment/create-payment"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "addressId": 5,
            "paymentMethod": "COD",
            "total": 90000.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({ "orderId": 77 }))))
        .expect(1)
        .mount(&app.backend)
        .await;

    let response = app
        .post_form("/checkout", &[("address_id", "5"), ("payment_method", "COD")])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/checkout/result?order_id=77");
}

#[tokio::test]
async fn test_checkout_without_payment_method_stays_on_page() {
    let app = spawn_storefront().await;
    app.login_as("CUSTOMER").await;
    mount_checkout_data(&app).await;
    Mock::given(method("POST"))
        .and(path("/payment/create-payment"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.backend)
        .await;

    let response = app.post_form("/checkout", &[("address_id", "5")]).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.text().await.unwrap().contains("Please select a payment method"));
}

#[tokio::test]
async fn test_wishlist_toggle_removes_saved_product() {
    let app = spawn_storefront().await;
    app.login_as("CUSTOMER").await;
    mount_get(
        &app.backend,
        "/wishlist",
        json!([{ "id": 7, "name": "Salmon cat treats", "price": 45000 }]),
    )
    .await;
    Mock::given(method("DELETE"))
        .and(path("/wishlist/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&app.backend)
        .await;

    let response = app
        .post_form(
            "/wishlist/toggle",
            &[("product_id", "7"), ("redirect_to", "/products/7")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/products/7");
}

#[tokio::test]
async fn test_wishlist_toggle_adds_new_product() {
    let app = spawn_storefront().await;
    app.login_as("CUSTOMER").await;
    mount_get(&app.backend, "/wishlist", json!([])).await;
    Mock::given(method("POST"))
        .and(path("/wishlist"))
        .and(body_partial_json(json!({ "productId": 9 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&app.backend)
        .await;

    let response = app.post_form("/wishlist/toggle", &[("product_id", "9")]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

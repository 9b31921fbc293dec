//! End-to-end HTTP tests for auth, cart, and checkout.
//!
//! These drive the full router, session layer included, the way a browser
//! client would: register, carry the session cookie, fill a cart, and
//! check out.

mod common;

use axum::http::StatusCode;
use serde_json::json;

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let pool = common::test_pool().await;
    let app = common::test_app(&pool).await;

    let response = common::send(&app, "GET", "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = common::send(&app, "GET", "/health/ready", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Auth Flow
// ============================================================================

#[tokio::test]
async fn test_register_login_me_logout() {
    let pool = common::test_pool().await;
    let app = common::test_app(&pool).await;

    let (user, cookie) = common::register(&app, "mai").await;
    assert_eq!(user["username"], "mai");
    assert_eq!(user["email"], "mai@example.com");
    assert_eq!(user["role"], "customer");
    assert!(
        user.get("passwordHash").is_none() && user.get("password_hash").is_none(),
        "the hash must never appear in a response"
    );

    // The registration cookie is already a live session.
    let response = common::send(&app, "GET", "/auth/me", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let me = common::body_json(response).await;
    assert_eq!(me["username"], "mai");

    // Without a cookie there is no session.
    let response = common::send(&app, "GET", "/auth/me", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Logout kills the session behind the cookie.
    let response = common::send(&app, "POST", "/auth/logout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = common::send(&app, "GET", "/auth/me", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Login works with the username or the email.
    let response = common::send_json(
        &app,
        "POST",
        "/auth/login",
        None,
        json!({ "identifier": "mai", "password": common::PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = common::send_json(
        &app,
        "POST",
        "/auth/login",
        None,
        json!({ "identifier": "mai@example.com", "password": common::PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = common::send_json(
        &app,
        "POST",
        "/auth/login",
        None,
        json!({ "identifier": "mai", "password": "wrong-password" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_validation_and_conflicts() {
    let pool = common::test_pool().await;
    let app = common::test_app(&pool).await;

    // Username too short.
    let response = common::send_json(
        &app,
        "POST",
        "/auth/register",
        None,
        json!({ "username": "ab", "email": "ab@example.com", "password": common::PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Password too short.
    let response = common::send_json(
        &app,
        "POST",
        "/auth/register",
        None,
        json!({ "username": "mai", "email": "mai@example.com", "password": "short" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Malformed email.
    let response = common::send_json(
        &app,
        "POST",
        "/auth/register",
        None,
        json!({ "username": "mai", "email": "no-at-symbol", "password": common::PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Taken username / taken email.
    common::register(&app, "mai").await;
    let response = common::send_json(
        &app,
        "POST",
        "/auth/register",
        None,
        json!({ "username": "mai", "email": "other@example.com", "password": common::PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = common::send_json(
        &app,
        "POST",
        "/auth/register",
        None,
        json!({ "username": "maiv2", "email": "mai@example.com", "password": common::PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_profile_update_flow() {
    let pool = common::test_pool().await;
    let app = common::test_app(&pool).await;

    let (user, cookie) = common::register(&app, "mai").await;
    let user_id = user["id"].as_i64().expect("user id");

    let response = common::send(
        &app,
        "GET",
        &format!("/api/users/{user_id}/profile"),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Set a phone, then clear it with a blank value.
    let response = common::send_json(
        &app,
        "PUT",
        &format!("/api/users/{user_id}/profile"),
        Some(&cookie),
        json!({ "phone": "0901234567" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = common::body_json(response).await;
    assert_eq!(updated["phone"], "0901234567");
    assert_eq!(updated["username"], "mai");

    let response = common::send_json(
        &app,
        "PUT",
        &format!("/api/users/{user_id}/profile"),
        Some(&cookie),
        json!({ "phone": "" }),
    )
    .await;
    let cleared = common::body_json(response).await;
    assert!(cleared["phone"].is_null());
}

#[tokio::test]
async fn test_user_scoped_routes_enforce_identity() {
    let pool = common::test_pool().await;
    let app = common::test_app(&pool).await;

    let (_alice, alice_cookie) = common::register(&app, "alice").await;
    let (bertha, _bertha_cookie) = common::register(&app, "bertha").await;
    let bertha_id = bertha["id"].as_i64().expect("user id");

    // No session at all.
    let response = common::send(&app, "GET", &format!("/api/users/{bertha_id}/cart"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Someone else's session.
    let response = common::send(
        &app,
        "GET",
        &format!("/api/users/{bertha_id}/cart"),
        Some(&alice_cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = common::send(
        &app,
        "GET",
        &format!("/api/users/{bertha_id}/orders"),
        Some(&alice_cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Cart and Checkout over HTTP
// ============================================================================

#[tokio::test]
async fn test_cart_to_order_journey() {
    let pool = common::test_pool().await;
    let app = common::test_app(&pool).await;
    let product = common::seed_product(&pool, "Bramble Fox", "10.00", 5).await;

    let (user, cookie) = common::register(&app, "mai").await;
    let user_id = user["id"].as_i64().expect("user id");

    // Add two units.
    let response = common::send_json(
        &app,
        "POST",
        &format!("/api/users/{user_id}/cart/items"),
        Some(&cookie),
        json!({ "productId": product.id, "quantity": 2 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cart = common::body_json(response).await;
    assert_eq!(cart["status"], "CART");
    assert_eq!(cart["totalQuantity"], 2);
    assert_eq!(cart["totalAmount"], "20.00");
    assert_eq!(cart["items"][0]["productName"], "Bramble Fox");
    assert_eq!(cart["items"][0]["unitPrice"], "10.00");
    let line_id = cart["items"][0]["lineItemId"].as_i64().expect("line id");

    // Bump the line to three units.
    let response = common::send_json(
        &app,
        "PUT",
        &format!("/api/users/{user_id}/cart/items/{line_id}"),
        Some(&cookie),
        json!({ "quantity": 3 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cart = common::body_json(response).await;
    assert_eq!(cart["totalQuantity"], 3);
    assert_eq!(cart["totalAmount"], "30.00");

    // Check out to the home province. A client-sent shippingFee is ignored.
    let response = common::send_json(
        &app,
        "POST",
        &format!("/api/users/{user_id}/orders"),
        Some(&cookie),
        json!({
            "cartItems": [{ "productId": product.id, "quantity": 3 }],
            "shippingAddress": "12 Tran Phu, Ward 4",
            "selectedProvince": "TP. Hồ Chí Minh",
            "phoneNumber": "0901234567",
            "shippingFee": "0.00",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = common::body_json(response).await;
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["subtotal"], "30.00");
    assert_eq!(order["shippingFee"], "5.00");
    assert_eq!(order["grandTotal"], "35.00");
    assert!(
        order["orderCode"]
            .as_str()
            .expect("order code")
            .starts_with("ORD-")
    );
    assert_eq!(order["items"][0]["subtotal"], "30.00");

    // The cart is gone and the order shows up in history.
    let response = common::send(
        &app,
        "GET",
        &format!("/api/users/{user_id}/cart"),
        Some(&cookie),
    )
    .await;
    let cart = common::body_json(response).await;
    assert!(cart["orderId"].is_null());
    assert_eq!(cart["totalQuantity"], 0);

    let response = common::send(
        &app,
        "GET",
        &format!("/api/users/{user_id}/orders"),
        Some(&cookie),
    )
    .await;
    let history = common::body_json(response).await;
    assert_eq!(history.as_array().expect("array").len(), 1);
    assert_eq!(history[0]["grandTotal"], "35.00");
}

#[tokio::test]
async fn test_cart_stock_conflict_is_409() {
    let pool = common::test_pool().await;
    let app = common::test_app(&pool).await;
    let product = common::seed_product(&pool, "Bramble Fox", "10.00", 5).await;

    let (user, cookie) = common::register(&app, "mai").await;
    let user_id = user["id"].as_i64().expect("user id");

    let response = common::send_json(
        &app,
        "POST",
        &format!("/api/users/{user_id}/cart/items"),
        Some(&cookie),
        json!({ "productId": product.id, "quantity": 99 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = common::body_json(response).await;
    let message = body["error"].as_str().expect("error message");
    assert!(message.contains("not enough stock"), "got: {message}");
}

#[tokio::test]
async fn test_clear_cart_endpoint() {
    let pool = common::test_pool().await;
    let app = common::test_app(&pool).await;
    let product = common::seed_product(&pool, "Bramble Fox", "10.00", 5).await;

    let (user, cookie) = common::register(&app, "mai").await;
    let user_id = user["id"].as_i64().expect("user id");

    common::send_json(
        &app,
        "POST",
        &format!("/api/users/{user_id}/cart/items"),
        Some(&cookie),
        json!({ "productId": product.id, "quantity": 1 }),
    )
    .await;

    let response = common::send(
        &app,
        "DELETE",
        &format!("/api/users/{user_id}/cart"),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = common::send(
        &app,
        "GET",
        &format!("/api/users/{user_id}/cart"),
        Some(&cookie),
    )
    .await;
    let cart = common::body_json(response).await;
    assert!(cart["items"].as_array().expect("array").is_empty());
}

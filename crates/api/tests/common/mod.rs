//! Shared helpers for integration tests.
//!
//! Every test runs against a fresh in-memory `SQLite` database with the
//! application migrations applied, so tests are independent and need no
//! external services.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tower::ServiceExt;
use tower_sessions_sqlx_store::SqliteStore;

use curio_core::{Email, GroupId, UserRole};

use curio_api::config::AppConfig;
use curio_api::db::{self, GroupRepository, NewProduct, NewUser, ProductRepository, UserRepository};
use curio_api::models::{Group, Product, User};
use curio_api::routes;
use curio_api::services::auth;
use curio_api::state::AppState;

/// Password shared by all test accounts.
pub const PASSWORD: &str = "correct horse battery";

/// Create a fresh in-memory database with migrations applied.
pub async fn test_pool() -> SqlitePool {
    let pool = db::create_pool(&SecretString::from("sqlite::memory:"))
        .await
        .expect("pool should open");
    db::MIGRATOR
        .run(&pool)
        .await
        .expect("migrations should apply");
    pool
}

/// Build the full router over the given pool, session layer included.
pub async fn test_app(pool: &SqlitePool) -> Router {
    let store = SqliteStore::new(pool.clone());
    store.migrate().await.expect("session store should migrate");

    routes::app(AppState::new(test_config(), pool.clone()), store)
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: SecretString::from("sqlite::memory:"),
        host: "127.0.0.1".parse().expect("valid host"),
        port: 0,
        base_url: "http://localhost".to_owned(),
        session_secret: SecretString::from("0123456789abcdef0123456789abcdef"),
    }
}

// ============================================================================
// Database Fixtures
// ============================================================================

/// Insert a customer account directly, skipping password hashing.
///
/// Fine for service-level tests; anything exercising login goes through
/// [`register`] instead.
pub async fn seed_customer(pool: &SqlitePool, username: &str) -> User {
    let email = Email::parse(&format!("{username}@example.com")).expect("valid email");
    UserRepository::new(pool)
        .create(NewUser {
            username,
            email: &email,
            phone: None,
            password_hash: "unverifiable-test-hash",
            avatar_url: None,
            role: UserRole::Customer,
        })
        .await
        .expect("user should insert")
}

/// Insert a group.
pub async fn seed_group(pool: &SqlitePool, name: &str) -> Group {
    GroupRepository::new(pool)
        .create(name, None)
        .await
        .expect("group should insert")
}

/// Insert an ungrouped product.
pub async fn seed_product(pool: &SqlitePool, name: &str, price: &str, stock: i64) -> Product {
    seed_product_in(pool, None, name, price, stock).await
}

/// Insert a product, optionally attached to a group.
pub async fn seed_product_in(
    pool: &SqlitePool,
    group_id: Option<GroupId>,
    name: &str,
    price: &str,
    stock: i64,
) -> Product {
    let price: Decimal = price.parse().expect("valid decimal");
    ProductRepository::new(pool)
        .create(NewProduct {
            name,
            group_id,
            version: None,
            description: None,
            price,
            image_url: None,
            stock_quantity: stock,
        })
        .await
        .expect("product should insert")
}

// ============================================================================
// HTTP Helpers
// ============================================================================

/// Send a request with a JSON body.
pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Value,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = builder
        .body(Body::from(body.to_string()))
        .expect("request should build");

    app.clone()
        .oneshot(request)
        .await
        .expect("request should be handled")
}

/// Send a bodyless request.
pub async fn send(app: &Router, method: &str, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = builder.body(Body::empty()).expect("request should build");

    app.clone()
        .oneshot(request)
        .await
        .expect("request should be handled")
}

/// Read the response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

/// Pull the `name=value` part of the session cookie from a response.
pub fn session_cookie(response: &Response<Body>) -> String {
    let raw = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response should set a session cookie")
        .to_str()
        .expect("cookie should be ASCII");
    raw.split(';')
        .next()
        .expect("cookie should have a name=value part")
        .to_owned()
}

/// Register an account over HTTP. Returns the created user JSON and the
/// session cookie.
pub async fn register(app: &Router, username: &str) -> (Value, String) {
    let response = send_json(
        app,
        "POST",
        "/auth/register",
        None,
        json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": PASSWORD,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let cookie = session_cookie(&response);
    let user = body_json(response).await;
    (user, cookie)
}

/// Create an admin account in the database and log it in over HTTP.
/// Returns the admin's session cookie.
pub async fn admin_cookie(pool: &SqlitePool, app: &Router) -> String {
    let email = Email::parse("boss@example.com").expect("valid email");
    let hash = auth::hash_password(PASSWORD).expect("hash should compute");
    UserRepository::new(pool)
        .create(NewUser {
            username: "boss",
            email: &email,
            phone: None,
            password_hash: &hash,
            avatar_url: None,
            role: UserRole::Admin,
        })
        .await
        .expect("admin should insert");

    let response = send_json(
        app,
        "POST",
        "/auth/login",
        None,
        json!({ "identifier": "boss", "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    session_cookie(&response)
}

//! HTTP route handlers for the curio API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                        - Liveness check
//! GET    /health/ready                  - Readiness check (pings the database)
//!
//! # Auth
//! POST   /auth/register                 - Create an account and sign in
//! POST   /auth/login                    - Sign in with username or email
//! POST   /auth/logout                   - Clear the session
//! GET    /auth/me                       - Current signed-in user
//!
//! # Catalog (reads public, writes admin-only)
//! GET    /api/products                  - Product listing (?group_id= filter)
//! POST   /api/products                  - Create product
//! GET    /api/products/{id}             - Product detail
//! PUT    /api/products/{id}             - Replace product
//! DELETE /api/products/{id}             - Delete product
//! GET    /api/groups                    - Group listing
//! POST   /api/groups                    - Create group
//! GET    /api/groups/{id}               - Group detail
//! PUT    /api/groups/{id}               - Replace group
//! DELETE /api/groups/{id}               - Delete group
//!
//! # Gallery
//! GET    /api/gallery                   - Public feed, newest first
//! POST   /api/gallery                   - Create post (requires session)
//!
//! # Per-user (session owner only)
//! GET    /api/users/{uid}/profile       - Profile
//! PUT    /api/users/{uid}/profile       - Update profile
//! GET    /api/users/{uid}/cart          - Cart view
//! DELETE /api/users/{uid}/cart          - Clear cart
//! POST   /api/users/{uid}/cart/items    - Add line to cart
//! PUT    /api/users/{uid}/cart/items/{id}    - Set line quantity
//! DELETE /api/users/{uid}/cart/items/{id}    - Remove line
//! GET    /api/users/{uid}/orders        - Order history
//! POST   /api/users/{uid}/orders        - Checkout
//! GET    /api/users/{uid}/wishlist      - Wishlist
//! POST   /api/users/{uid}/wishlist/{pid}     - Add to wishlist
//! DELETE /api/users/{uid}/wishlist/{pid}     - Remove from wishlist
//! GET    /api/users/{uid}/collection    - Owned figures
//! POST   /api/users/{uid}/collection/{pid}   - Mark as owned
//! DELETE /api/users/{uid}/collection/{pid}   - Remove from collection
//! ```

pub mod auth;
pub mod cart;
pub mod collection;
pub mod gallery;
pub mod groups;
pub mod orders;
pub mod products;
pub mod users;
pub mod wishlist;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;
use tower_sessions_sqlx_store::SqliteStore;

use crate::middleware::create_session_layer;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route(
            "/{product_id}",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the group routes router.
pub fn group_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(groups::list).post(groups::create))
        .route(
            "/{group_id}",
            get(groups::get).put(groups::update).delete(groups::delete),
        )
}

/// Create the gallery routes router.
pub fn gallery_routes() -> Router<AppState> {
    Router::new().route("/", get(gallery::list).post(gallery::create))
}

/// Create the per-user routes router, nested under `/api/users/{user_id}`.
///
/// Every handler in here checks the session against the path `user_id`.
pub fn user_scoped_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/{item_id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route(
            "/orders",
            get(orders::list_orders).post(orders::create_order),
        )
        .route("/wishlist", get(wishlist::list))
        .route(
            "/wishlist/{product_id}",
            post(wishlist::add).delete(wishlist::remove),
        )
        .route("/collection", get(collection::list))
        .route(
            "/collection/{product_id}",
            post(collection::add).delete(collection::remove),
        )
}

/// Build the complete application router with the session and tracing
/// layers applied.
///
/// The session store's table must already exist; callers run
/// `store.migrate()` once before this.
pub fn app(state: AppState, session_store: SqliteStore) -> Router {
    let session_layer = create_session_layer(session_store, state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/auth", auth_routes())
        .nest("/api/products", product_routes())
        .nest("/api/groups", group_routes())
        .nest("/api/gallery", gallery_routes())
        .nest("/api/users/{user_id}", user_scoped_routes())
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

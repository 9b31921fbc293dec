//! HTTP middleware stack.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. `TraceLayer` (request tracing)
//! 2. Session layer (tower-sessions with `SQLite` store)

pub mod auth;
pub mod session;

pub use auth::{
    RequireAdmin, RequireUser, clear_current_user, ensure_same_user, set_current_user,
};
pub use session::create_session_layer;

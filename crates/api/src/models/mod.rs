//! Domain models for the Curio API.
//!
//! These are validated domain objects, separate from the database row types
//! that live in [`crate::db`]. Types that double as API responses derive
//! `Serialize` with camelCase field names; the cart and order wire shapes are
//! assembled separately in [`crate::services`].

pub mod gallery;
pub mod group;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use gallery::GalleryPost;
pub use group::Group;
pub use order::{Order, OrderItem};
pub use product::Product;
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;

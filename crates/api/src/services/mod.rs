//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, login and password hashing
//! - `cart` - Cart mutations with transactional totals
//! - `orders` - Checkout and order history
//! - `shipping` - Province-tiered shipping fees

pub mod auth;
pub mod cart;
pub mod orders;
pub mod shipping;

pub use auth::{AuthError, AuthService, NewAccount, ProfileUpdate};
pub use cart::{CartError, CartItemView, CartService, CartView};
pub use orders::{Checkout, CheckoutItem, OrderError, OrderItemView, OrderService, OrderView};

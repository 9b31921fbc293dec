//! Status enums for orders and users.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an order row.
///
/// A user's open cart is stored as an order in the `Cart` state; checkout
/// converts it to `Pending`. Later states are driven by fulfillment.
///
/// Stored in SQLite as TEXT in `SCREAMING_SNAKE_CASE` (`"CART"`, `"PENDING"`,
/// ...), matching the serialized JSON form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Open cart, mutable, at most one per user.
    #[default]
    Cart,
    /// Placed at checkout, awaiting payment.
    Pending,
    Paid,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// The stored TEXT form of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cart => "CART",
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Shipped => "SHIPPED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CART" => Ok(Self::Cart),
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "SHIPPED" => Ok(Self::Shipped),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Account role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular storefront account.
    #[default]
    Customer,
    /// Full access to catalog management.
    Admin,
}

impl UserRole {
    /// True for accounts allowed to modify the catalog.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_text_roundtrip() {
        let all = [
            OrderStatus::Cart,
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Shipped,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ];
        for status in all {
            let parsed: OrderStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_order_status_rejects_unknown() {
        assert!("DRAFT".parse::<OrderStatus>().is_err());
        assert!("cart".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_order_status_serde_matches_stored_form() {
        let json = serde_json::to_string(&OrderStatus::Pending).unwrap();
        assert_eq!(json, "\"PENDING\"");
    }

    #[test]
    fn test_user_role_text_roundtrip() {
        for role in [UserRole::Customer, UserRole::Admin] {
            let parsed: UserRole = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_is_admin() {
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::Customer.is_admin());
    }
}

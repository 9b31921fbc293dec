//! Shipping fee calculation.
//!
//! Fees are tiered by delivery province relative to the warehouse in
//! Ho Chi Minh City. Matching is exact, so a misspelled or unknown
//! province falls through to the default tier.

use rust_decimal::Decimal;

/// Province the warehouse ships from.
const HOME_PROVINCE: &str = "TP. Hồ Chí Minh";

/// Provinces adjacent to the warehouse region.
const NEARBY_PROVINCES: [&str; 6] = [
    "Đồng Nai",
    "Bình Dương",
    "Bà Rịa - Vũng Tàu",
    "Long An",
    "Tiền Giang",
    "Cần Thơ",
];

/// Shipping fee for a delivery province.
///
/// # Returns
///
/// 5.00 for the home province, 7.00 for a nearby province, and 10.00
/// for everywhere else (including an empty or unrecognized province).
#[must_use]
pub fn fee(province: &str) -> Decimal {
    if province == HOME_PROVINCE {
        Decimal::new(500, 2)
    } else if NEARBY_PROVINCES.contains(&province) {
        Decimal::new(700, 2)
    } else {
        Decimal::new(1000, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_province_fee() {
        assert_eq!(fee("TP. Hồ Chí Minh"), Decimal::new(500, 2));
    }

    #[test]
    fn test_nearby_province_fee() {
        assert_eq!(fee("Đồng Nai"), Decimal::new(700, 2));
        assert_eq!(fee("Cần Thơ"), Decimal::new(700, 2));
    }

    #[test]
    fn test_remote_province_fee() {
        assert_eq!(fee("Hà Nội"), Decimal::new(1000, 2));
    }

    #[test]
    fn test_unrecognized_input_uses_default_tier() {
        // Matching is exact, stray whitespace falls through.
        assert_eq!(fee("TP. Hồ Chí Minh "), Decimal::new(1000, 2));
        assert_eq!(fee(""), Decimal::new(1000, 2));
    }
}

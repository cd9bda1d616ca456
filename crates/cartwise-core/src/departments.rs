//! Department code lookup
//!
//! Receipts only carry numeric department codes. Labels come from a static
//! table; unknown codes render as `Dept {n}`.

/// Department for gift cards, memberships and services.
pub const GIFT_CARDS_SERVICES: u32 = 75;

/// Department for pharmacy, optical and wellness purchases.
pub const PHARMACY_WELLNESS: u32 = 93;

/// Departments that never earn executive rewards.
pub const DEFAULT_REWARD_EXCLUSIONS: &[u32] = &[GIFT_CARDS_SERVICES, PHARMACY_WELLNESS];

const DEPARTMENTS: &[(u32, &str)] = &[
    (11, "Candy & Snacks"),
    (12, "Tobacco"),
    (13, "Grocery"),
    (14, "Beverages"),
    (15, "Household & Cleaning"),
    (16, "Health & Beauty"),
    (17, "Frozen Foods"),
    (18, "Deli"),
    (19, "Dairy & Refrigerated"),
    (20, "Wine & Spirits"),
    (21, "Small Electrics"),
    (23, "Office & Stationery"),
    (24, "Electronics"),
    (26, "Hardware & Automotive"),
    (28, "Sporting Goods"),
    (31, "Clothing & Apparel"),
    (32, "Books & Media"),
    (34, "Home Furnishings"),
    (38, "Toys & Seasonal"),
    (39, "Jewelry"),
    (53, "Optical"),
    (61, "Fresh Produce"),
    (62, "Fresh Meat"),
    (63, "Bakery"),
    (64, "Seafood"),
    (65, "Service Deli"),
    (75, "Gift Cards/Services"),
    (87, "Tires"),
    (92, "Gasoline"),
    (93, "Pharmacy/Wellness"),
];

/// Label for a department code.
pub fn department_label(code: u32) -> String {
    DEPARTMENTS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| format!("Dept {}", code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_department() {
        assert_eq!(department_label(75), "Gift Cards/Services");
        assert_eq!(department_label(93), "Pharmacy/Wellness");
        assert_eq!(department_label(61), "Fresh Produce");
    }

    #[test]
    fn test_unknown_department_fallback() {
        assert_eq!(department_label(999), "Dept 999");
    }
}

//! Domain models for Cartwise

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transaction types that mark a whole receipt as a refund
pub const REFUND_TYPES: &[&str] = &["Refund", "Return", "Returned"];

/// Transaction types dropped before receipts reach the store
pub const CANCELLED_TYPES: &[&str] = &["Cancelled", "Canceled"];

/// Every transaction type the vendor exports are known to use
pub const KNOWN_TRANSACTION_TYPES: &[&str] = &[
    "Sales",
    "Delivered",
    "Refund",
    "Return",
    "Returned",
    "Cancelled",
    "Canceled",
];

/// Purchase path of a receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// In-person warehouse purchase
    Warehouse,
    /// Online order
    Online,
    /// Fuel purchase at a warehouse gas station
    GasStation,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warehouse => "warehouse",
            Self::Online => "online",
            Self::GasStation => "gas_station",
        }
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "warehouse" | "in-warehouse" => Ok(Self::Warehouse),
            "online" => Ok(Self::Online),
            "gas_station" | "gas station" | "gas" => Ok(Self::GasStation),
            _ => Err(format!("Unknown channel: {}", s)),
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unit column of an item line
///
/// Warehouse exports carry a signed count; online exports carry a unit label
/// such as `"EA"`, which always means a single unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Numeric(f64),
    Labeled(String),
}

impl Quantity {
    /// Resolved signed quantity
    pub fn value(&self) -> f64 {
        match self {
            Self::Numeric(v) => *v,
            Self::Labeled(_) => 1.0,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Numeric(_) => None,
            Self::Labeled(label) => Some(label),
        }
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::Numeric(0.0)
    }
}

/// Fuel details present on gas station lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelDetails {
    pub grade: Option<String>,
    /// Gallons or liters pumped
    pub quantity: f64,
    pub unit_of_measure: Option<String>,
}

/// One line of a receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub item_number: String,
    /// Negative for discounts and returns
    pub amount: f64,
    pub unit: Quantity,
    /// `unit` resolved to a number
    pub quantity: f64,
    pub unit_price: f64,
    /// Raw description as exported
    pub description: Option<String>,
    pub normalized_name: String,
    pub is_discount: bool,
    pub is_return: bool,
    /// Item number a discount line refers to (from a "/1234567" name)
    pub discount_applies_to: Option<String>,
    pub department_number: Option<u32>,
    pub department_name: Option<String>,
    pub fuel: Option<FuelDetails>,
}

impl Item {
    /// A regular purchased line: neither a discount nor a return
    pub fn is_purchase(&self) -> bool {
        !self.is_discount && !self.is_return
    }
}

/// A normalized receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: String,
    /// Vendor barcode; preferred dedup key when present
    pub transaction_barcode: Option<String>,
    pub transaction_date_time: Option<NaiveDateTime>,
    /// Normalized type ("Delivered" collapses to "Sales")
    pub transaction_type: String,
    pub warehouse_number: String,
    pub warehouse_name: String,
    pub warehouse_city: Option<String>,
    pub warehouse_state: Option<String>,
    pub membership_number: Option<String>,
    pub total: f64,
    pub sub_total: f64,
    pub taxes: f64,
    pub instant_savings: f64,
    pub items: Vec<Item>,
    pub channel: Channel,
    /// Travel bookings never earn rewards
    pub is_travel: bool,
    pub source_file: String,
    /// Raw payload as ingested
    #[serde(rename = "_original")]
    pub original: Value,
}

impl Receipt {
    /// A refund receipt reverses money rather than spending it
    pub fn is_refund(&self) -> bool {
        REFUND_TYPES
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&self.transaction_type))
            || self.total < 0.0
    }

    pub fn is_cancelled(&self) -> bool {
        CANCELLED_TYPES
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&self.transaction_type))
    }

    /// Calendar day of the transaction
    pub fn date(&self) -> Option<NaiveDate> {
        self.transaction_date_time.map(|dt| dt.date())
    }

    /// Key used to recognize the same receipt across exports
    pub fn dedup_key(&self) -> &str {
        self.transaction_barcode.as_deref().unwrap_or(&self.id)
    }

    /// Contribution of a signed amount to net aggregates: refunds always
    /// subtract their magnitude.
    pub fn signed(&self, value: f64) -> f64 {
        if self.is_refund() {
            -value.abs()
        } else {
            value
        }
    }

    /// Warehouse grouping key; online orders share a single group
    pub fn warehouse_key(&self) -> &str {
        if self.channel == Channel::Online {
            ONLINE_WAREHOUSE
        } else {
            &self.warehouse_number
        }
    }
}

/// Sentinel warehouse key for online orders
pub const ONLINE_WAREHOUSE: &str = "ONLINE";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_value() {
        assert_eq!(Quantity::Numeric(3.0).value(), 3.0);
        assert_eq!(Quantity::Numeric(-1.0).value(), -1.0);
        assert_eq!(Quantity::Labeled("EA".into()).value(), 1.0);
        assert_eq!(Quantity::Labeled("EA".into()).label(), Some("EA"));
    }

    #[test]
    fn test_quantity_serializes_untagged() {
        let json = serde_json::to_string(&Quantity::Labeled("EA".into())).unwrap();
        assert_eq!(json, "\"EA\"");
        let json = serde_json::to_string(&Quantity::Numeric(2.0)).unwrap();
        assert_eq!(json, "2.0");
    }

    #[test]
    fn test_channel_parse() {
        assert_eq!("In-Warehouse".parse::<Channel>().unwrap(), Channel::Warehouse);
        assert_eq!("Gas Station".parse::<Channel>().unwrap(), Channel::GasStation);
        assert_eq!("online".parse::<Channel>().unwrap(), Channel::Online);
        assert!("mail".parse::<Channel>().is_err());
    }
}

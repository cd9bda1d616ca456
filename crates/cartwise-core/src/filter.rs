//! Receipt filter engine
//!
//! [`ReceiptFilter`] holds the current filter criteria and narrows a receipt
//! slice with a conjunctive predicate pipeline. Predicates are evaluated in a
//! fixed order (date range, channel, warehouse, membership, transaction type,
//! search) regardless of the order the criteria were set in.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{Channel, Receipt};

/// Named date-range preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    #[default]
    All,
    Ytd,
    Last12,
    Custom,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Ytd => "ytd",
            Self::Last12 => "last12",
            Self::Custom => "custom",
        }
    }
}

impl std::str::FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "ytd" => Ok(Self::Ytd),
            "last12" | "last-12" | "last-12-months" => Ok(Self::Last12),
            "custom" => Ok(Self::Custom),
            _ => Err(format!("Unknown preset: {}", s)),
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Warehouse criterion: a specific warehouse number or every online order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarehouseFilter {
    Number(String),
    Online,
}

impl std::str::FromStr for WarehouseFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            Err("Empty warehouse".to_string())
        } else if s.eq_ignore_ascii_case("online") {
            Ok(Self::Online)
        } else {
            Ok(Self::Number(s.to_string()))
        }
    }
}

/// Channel criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelFilter {
    /// In-person purchases, including the gas station
    Warehouse,
    Online,
    GasStation,
}

impl ChannelFilter {
    fn matches(&self, channel: Channel) -> bool {
        match self {
            Self::Warehouse => matches!(channel, Channel::Warehouse | Channel::GasStation),
            Self::Online => channel == Channel::Online,
            Self::GasStation => channel == Channel::GasStation,
        }
    }
}

impl std::str::FromStr for ChannelFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.parse::<Channel>()? {
            Channel::Warehouse => Ok(Self::Warehouse),
            Channel::Online => Ok(Self::Online),
            Channel::GasStation => Ok(Self::GasStation),
        }
    }
}

/// Current filter criteria
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub warehouse: Option<WarehouseFilter>,
    pub channel: Option<ChannelFilter>,
    pub membership: Option<String>,
    pub search: Option<String>,
    pub transaction_type: Option<String>,
    pub preset: Preset,
}

impl ReceiptFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit date range; the preset becomes `Custom`
    pub fn set_date_range(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        self.start = start;
        self.end = end;
        self.preset = Preset::Custom;
    }

    pub fn set_warehouse(&mut self, warehouse: Option<WarehouseFilter>) {
        self.warehouse = warehouse;
    }

    pub fn set_channel(&mut self, channel: Option<ChannelFilter>) {
        self.channel = channel;
    }

    pub fn set_membership(&mut self, membership: Option<String>) {
        self.membership = membership.filter(|m| !m.trim().is_empty());
    }

    pub fn set_search(&mut self, search: Option<String>) {
        self.search = search.filter(|s| !s.trim().is_empty());
    }

    pub fn set_transaction_type(&mut self, transaction_type: Option<String>) {
        self.transaction_type = transaction_type.filter(|t| !t.trim().is_empty());
    }

    /// Apply a preset relative to today's local date
    pub fn set_preset(&mut self, preset: Preset) {
        self.set_preset_as_of(preset, chrono::Local::now().date_naive());
    }

    /// Apply a preset relative to `today`
    pub fn set_preset_as_of(&mut self, preset: Preset, today: NaiveDate) {
        match preset {
            Preset::All => {
                self.start = None;
                self.end = None;
            }
            Preset::Ytd => {
                self.start = NaiveDate::from_ymd_opt(today.year(), 1, 1);
                self.end = Some(today);
            }
            Preset::Last12 => {
                self.start = today.checked_sub_months(Months::new(12));
                self.end = Some(today);
            }
            Preset::Custom => {}
        }
        self.preset = preset;
    }

    /// Reset every criterion
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True when no criterion narrows the set
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.end.is_none()
            && self.warehouse.is_none()
            && self.channel.is_none()
            && self.membership.is_none()
            && self.search.is_none()
            && self.transaction_type.is_none()
    }

    fn matches_date(&self, receipt: &Receipt) -> bool {
        if self.start.is_none() && self.end.is_none() {
            return true;
        }
        let Some(date) = receipt.date() else {
            return false;
        };
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }

    fn matches_channel(&self, receipt: &Receipt) -> bool {
        self.channel.map_or(true, |c| c.matches(receipt.channel))
    }

    fn matches_warehouse(&self, receipt: &Receipt) -> bool {
        match &self.warehouse {
            None => true,
            Some(WarehouseFilter::Online) => receipt.channel == Channel::Online,
            // Online orders are grouped under the sentinel, never their fulfilling warehouse
            Some(WarehouseFilter::Number(n)) => {
                receipt.channel != Channel::Online && receipt.warehouse_number == *n
            }
        }
    }

    fn matches_membership(&self, receipt: &Receipt) -> bool {
        match &self.membership {
            None => true,
            Some(m) => receipt.membership_number.as_deref() == Some(m.trim()),
        }
    }

    fn matches_transaction_type(&self, receipt: &Receipt) -> bool {
        match &self.transaction_type {
            None => true,
            Some(t) => receipt.transaction_type.eq_ignore_ascii_case(t.trim()),
        }
    }

    fn matches_search(&self, receipt: &Receipt) -> bool {
        let Some(term) = &self.search else {
            return true;
        };
        let term = term.trim().to_lowercase();
        receipt.items.iter().any(|item| {
            item.normalized_name.to_lowercase().contains(&term)
                || item
                    .description
                    .as_deref()
                    .map(|d| d.to_lowercase().contains(&term))
                    .unwrap_or(false)
                || item.item_number.to_lowercase().contains(&term)
        })
    }

    /// Whether a receipt passes every criterion
    pub fn matches(&self, receipt: &Receipt) -> bool {
        self.matches_date(receipt)
            && self.matches_channel(receipt)
            && self.matches_warehouse(receipt)
            && self.matches_membership(receipt)
            && self.matches_transaction_type(receipt)
            && self.matches_search(receipt)
    }

    /// Narrow a receipt slice to the matching receipts
    pub fn apply(&self, receipts: &[Receipt]) -> Vec<Receipt> {
        receipts
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_receipt;
    use serde_json::json;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Vec<Receipt> {
        let raws = vec![
            json!({"warehouseNumber": 1, "transactionNumber": 1, "transactionDateTime": "2024-01-10T10:00:00",
                   "transactionType": "Sales", "total": 10.0, "membershipNumber": "111",
                   "itemArray": [{"itemNumber": "100", "itemDescription01": "ORGANIC EGGS", "amount": 10.0, "unit": 1}]}),
            json!({"warehouseNumber": 2, "transactionNumber": 2, "transactionDateTime": "2024-03-01T10:00:00",
                   "receiptType": "Gas Station", "transactionType": "Sales", "total": 40.0, "membershipNumber": "111",
                   "itemArray": [{"itemNumber": "800", "itemDescription01": "REGULAR", "amount": 40.0, "unit": 1}]}),
            json!({"warehouseNumber": 847, "orderNumber": "9", "orderPlacedDate": "2024-06-15", "channel": "online",
                   "transactionType": "Delivered", "total": 80.0, "membershipNumber": "222",
                   "itemArray": [{"itemNumber": "9001", "itemName": "Blender", "amount": 80.0, "unit": "EA"}]}),
            json!({"warehouseNumber": 1, "transactionNumber": 4, "transactionDateTime": "2024-07-04T10:00:00",
                   "transactionType": "Refund", "total": -10.0, "membershipNumber": "111",
                   "itemArray": [{"itemNumber": "100", "itemDescription01": "ORGANIC EGGS", "amount": -10.0, "unit": -1}]}),
            json!({"warehouseNumber": 1, "transactionNumber": 5, "transactionDate": "bogus",
                   "transactionType": "Sales", "total": 3.0,
                   "itemArray": [{"itemNumber": "300", "itemDescription01": "BANANAS", "amount": 3.0, "unit": 1}]}),
        ];
        raws.iter()
            .enumerate()
            .map(|(i, r)| normalize_receipt(r, i, "sample.json"))
            .collect()
    }

    fn ids(receipts: &[Receipt]) -> Vec<String> {
        receipts.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let receipts = sample();
        let filter = ReceiptFilter::new();
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&receipts).len(), receipts.len());
    }

    #[test]
    fn test_date_range_inclusive_and_excludes_undated() {
        let receipts = sample();
        let mut filter = ReceiptFilter::new();
        filter.set_date_range(Some(ymd(2024, 1, 10)), Some(ymd(2024, 6, 15)));
        assert_eq!(filter.preset, Preset::Custom);
        assert_eq!(filter.apply(&receipts).len(), 3);
    }

    #[test]
    fn test_channel_warehouse_includes_gas() {
        let receipts = sample();
        let mut filter = ReceiptFilter::new();
        filter.set_channel(Some(ChannelFilter::Warehouse));
        assert_eq!(filter.apply(&receipts).len(), 4);

        filter.set_channel(Some(ChannelFilter::GasStation));
        assert_eq!(filter.apply(&receipts).len(), 1);

        filter.set_channel(Some(ChannelFilter::Online));
        assert_eq!(filter.apply(&receipts).len(), 1);
    }

    #[test]
    fn test_warehouse_sentinel_and_number() {
        let receipts = sample();
        let mut filter = ReceiptFilter::new();
        filter.set_warehouse(Some("online".parse().unwrap()));
        let online = filter.apply(&receipts);
        assert_eq!(online.len(), 1);
        assert_eq!(online[0].warehouse_name, "Online");

        filter.set_warehouse(Some(WarehouseFilter::Number("1".into())));
        assert_eq!(filter.apply(&receipts).len(), 3);
    }

    #[test]
    fn test_warehouse_number_skips_online_orders() {
        let receipts = sample();
        let online = &receipts[2];
        assert_eq!(online.warehouse_number, "847");

        let mut filter = ReceiptFilter::new();
        filter.set_warehouse(Some(WarehouseFilter::Number("847".into())));
        assert!(!filter.matches(online));
        assert!(filter.apply(&receipts).is_empty());
    }

    #[test]
    fn test_membership_and_type() {
        let receipts = sample();
        let mut filter = ReceiptFilter::new();
        filter.set_membership(Some("111".into()));
        assert_eq!(filter.apply(&receipts).len(), 3);

        filter.set_transaction_type(Some("refund".into()));
        assert_eq!(filter.apply(&receipts).len(), 1);
    }

    #[test]
    fn test_delivered_matches_sales_type() {
        let receipts = sample();
        let mut filter = ReceiptFilter::new();
        filter.set_channel(Some(ChannelFilter::Online));
        filter.set_transaction_type(Some("Sales".into()));
        assert_eq!(filter.apply(&receipts).len(), 1);
    }

    #[test]
    fn test_search_name_and_number_case_insensitive() {
        let receipts = sample();
        let mut filter = ReceiptFilter::new();
        filter.set_search(Some("eggs".into()));
        assert_eq!(filter.apply(&receipts).len(), 2);

        filter.set_search(Some("900".into()));
        assert_eq!(filter.apply(&receipts).len(), 1);

        filter.set_search(Some("   ".into()));
        assert!(filter.search.is_none());
    }

    #[test]
    fn test_construction_order_does_not_matter() {
        let receipts = sample();

        let mut a = ReceiptFilter::new();
        a.set_warehouse(Some(WarehouseFilter::Number("1".into())));
        a.set_date_range(Some(ymd(2024, 1, 1)), Some(ymd(2024, 12, 31)));
        a.set_search(Some("egg".into()));

        let mut b = ReceiptFilter::new();
        b.set_search(Some("egg".into()));
        b.set_date_range(Some(ymd(2024, 1, 1)), Some(ymd(2024, 12, 31)));
        b.set_warehouse(Some(WarehouseFilter::Number("1".into())));

        assert_eq!(ids(&a.apply(&receipts)), ids(&b.apply(&receipts)));
        assert_eq!(a.apply(&receipts).len(), 2);
    }

    #[test]
    fn test_presets() {
        let today = ymd(2024, 8, 20);
        let mut filter = ReceiptFilter::new();

        filter.set_preset_as_of(Preset::Ytd, today);
        assert_eq!(filter.start, Some(ymd(2024, 1, 1)));
        assert_eq!(filter.end, Some(today));
        assert_eq!(filter.preset, Preset::Ytd);

        filter.set_preset_as_of(Preset::Last12, today);
        assert_eq!(filter.start, Some(ymd(2023, 8, 20)));
        assert_eq!(filter.end, Some(today));

        filter.set_preset_as_of(Preset::Custom, today);
        assert_eq!(filter.start, Some(ymd(2023, 8, 20)));
        assert_eq!(filter.preset, Preset::Custom);

        filter.set_preset_as_of(Preset::All, today);
        assert_eq!(filter.start, None);
        assert_eq!(filter.end, None);
        assert_eq!(filter.preset, Preset::All);
    }

    #[test]
    fn test_explicit_range_forces_custom() {
        let mut filter = ReceiptFilter::new();
        filter.set_preset_as_of(Preset::Ytd, ymd(2024, 5, 1));
        filter.set_date_range(None, Some(ymd(2024, 2, 1)));
        assert_eq!(filter.preset, Preset::Custom);
        assert_eq!(filter.start, None);
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!("YTD".parse::<Preset>().unwrap(), Preset::Ytd);
        assert_eq!("last-12-months".parse::<Preset>().unwrap(), Preset::Last12);
        assert!("forever".parse::<Preset>().is_err());
    }
}

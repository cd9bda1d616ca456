//! Per-item analytics: top items, price history and price trends

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::Receipt;
use crate::money::{percent_of, round_cents};
use crate::stats::totals::line_units;

/// One observed purchase price
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: Option<NaiveDateTime>,
    pub price: f64,
    pub warehouse_number: String,
}

/// Everything known about one item number across a receipt set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemSummary {
    pub item_number: String,
    pub name: String,
    pub department_number: Option<u32>,
    pub department_name: Option<String>,
    /// Net units (refunded units subtracted)
    pub total_quantity: f64,
    /// Net spend (refunded amounts subtracted)
    pub total_spent: f64,
    /// Times bought on non-refund receipts
    pub purchase_count: usize,
    pub refund_count: usize,
    pub min_price: f64,
    pub max_price: f64,
    pub first_price: f64,
    pub last_price: f64,
    /// `last_price - first_price`
    pub price_trend: f64,
    pub first_date: Option<NaiveDateTime>,
    pub last_date: Option<NaiveDateTime>,
    /// Prices from non-refund receipts, oldest first
    pub price_history: Vec<PricePoint>,
}

/// Ordering for [`get_top_items`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TopItemSort {
    Quantity,
    Frequency,
    #[default]
    Spending,
}

impl TopItemSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quantity => "quantity",
            Self::Frequency => "frequency",
            Self::Spending => "spending",
        }
    }
}

impl std::str::FromStr for TopItemSort {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quantity" | "qty" => Ok(Self::Quantity),
            "frequency" | "count" => Ok(Self::Frequency),
            "spending" | "spend" | "total" => Ok(Self::Spending),
            _ => Err(format!("Unknown sort: {} (expected quantity, frequency or spending)", s)),
        }
    }
}

impl std::fmt::Display for TopItemSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Price movement of an item bought at least twice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceChange {
    pub item_number: String,
    pub name: String,
    pub first_price: f64,
    pub last_price: f64,
    pub price_change: f64,
    pub percent_change: f64,
    pub purchase_count: usize,
    pub first_date: Option<NaiveDateTime>,
    pub last_date: Option<NaiveDateTime>,
}

#[derive(Default)]
struct ItemAcc {
    name: String,
    department_number: Option<u32>,
    department_name: Option<String>,
    quantity: f64,
    spent: f64,
    purchases: usize,
    refunds: usize,
    history: Vec<PricePoint>,
}

/// Summarize every non-discount item number, in first-seen order
pub fn summarize_items(receipts: &[Receipt]) -> Vec<ItemSummary> {
    let mut order: Vec<String> = Vec::new();
    let mut items: HashMap<String, ItemAcc> = HashMap::new();

    for receipt in receipts {
        let refund = receipt.is_refund();
        for item in receipt.items.iter().filter(|i| !i.is_discount) {
            let acc = items.entry(item.item_number.clone()).or_insert_with(|| {
                order.push(item.item_number.clone());
                ItemAcc::default()
            });

            // Returned lines carry bare item numbers; prefer a real product name
            if acc.name.is_empty() || (!refund && !item.is_return) {
                acc.name = item.normalized_name.clone();
            }
            if acc.department_number.is_none() {
                acc.department_number = item.department_number;
                acc.department_name = item.department_name.clone();
            }

            acc.quantity += receipt.signed(line_units(item));
            acc.spent += receipt.signed(item.amount);

            if refund || item.is_return {
                acc.refunds += 1;
            } else {
                acc.purchases += 1;
                if item.unit_price > 0.0 {
                    acc.history.push(PricePoint {
                        date: receipt.transaction_date_time,
                        price: item.unit_price,
                        warehouse_number: receipt.warehouse_key().to_string(),
                    });
                }
            }
        }
    }

    order
        .into_iter()
        .filter_map(|number| items.remove(&number).map(|acc| (number, acc)))
        .map(|(item_number, mut acc)| {
            // Undated prices sort last
            acc.history.sort_by_key(|p| (p.date.is_none(), p.date));

            let first = acc.history.first();
            let last = acc.history.last();
            let first_price = first.map(|p| p.price).unwrap_or(0.0);
            let last_price = last.map(|p| p.price).unwrap_or(0.0);
            let min_price = acc.history.iter().map(|p| p.price).fold(f64::INFINITY, f64::min);
            let max_price = acc.history.iter().map(|p| p.price).fold(0.0, f64::max);

            ItemSummary {
                item_number,
                name: acc.name,
                department_number: acc.department_number,
                department_name: acc.department_name,
                total_quantity: acc.quantity,
                total_spent: round_cents(acc.spent),
                purchase_count: acc.purchases,
                refund_count: acc.refunds,
                min_price: if min_price.is_finite() { min_price } else { 0.0 },
                max_price,
                first_price,
                last_price,
                price_trend: round_cents(last_price - first_price),
                first_date: first.and_then(|p| p.date),
                last_date: last.and_then(|p| p.date),
                price_history: acc.history,
            }
        })
        .collect()
}

fn rank(mut items: Vec<ItemSummary>, sort: TopItemSort) -> Vec<ItemSummary> {
    items.sort_by(|a, b| {
        let primary = match sort {
            TopItemSort::Quantity => b.total_quantity.total_cmp(&a.total_quantity),
            TopItemSort::Frequency => b.purchase_count.cmp(&a.purchase_count),
            TopItemSort::Spending => b.total_spent.total_cmp(&a.total_spent),
        };
        primary
            .then_with(|| b.total_spent.total_cmp(&a.total_spent))
            .then_with(|| a.item_number.cmp(&b.item_number))
    });
    items
}

/// Items with positive net spend, best first.
///
/// Fully refunded items drop out.
pub fn get_top_items(receipts: &[Receipt], limit: usize, sort: TopItemSort) -> Vec<ItemSummary> {
    let items: Vec<ItemSummary> = summarize_items(receipts)
        .into_iter()
        .filter(|i| i.total_spent > 0.0)
        .collect();
    let mut ranked = rank(items, sort);
    ranked.truncate(limit);
    ranked
}

/// Items bought most often
pub fn get_frequent_items(receipts: &[Receipt], limit: usize) -> Vec<ItemSummary> {
    get_top_items(receipts, limit, TopItemSort::Frequency)
}

/// Items with the highest observed unit price
pub fn get_most_expensive_items(receipts: &[Receipt], limit: usize) -> Vec<ItemSummary> {
    let mut items = get_top_items(receipts, usize::MAX, TopItemSort::Spending);
    items.sort_by(|a, b| {
        b.max_price
            .total_cmp(&a.max_price)
            .then_with(|| a.item_number.cmp(&b.item_number))
    });
    items.truncate(limit);
    items
}

fn price_changes(receipts: &[Receipt]) -> Vec<PriceChange> {
    get_top_items(receipts, usize::MAX, TopItemSort::Spending)
        .into_iter()
        .filter(|i| i.price_history.len() >= 2)
        .map(|i| PriceChange {
            percent_change: round_cents(percent_of(i.price_trend, i.first_price)),
            item_number: i.item_number,
            name: i.name,
            first_price: i.first_price,
            last_price: i.last_price,
            price_change: i.price_trend,
            purchase_count: i.purchase_count,
            first_date: i.first_date,
            last_date: i.last_date,
        })
        .collect()
}

/// Items whose latest price is above their first, largest rise first
pub fn get_price_increases(receipts: &[Receipt], limit: usize) -> Vec<PriceChange> {
    let mut changes: Vec<PriceChange> = price_changes(receipts)
        .into_iter()
        .filter(|c| c.price_change > 0.0)
        .collect();
    changes.sort_by(|a, b| {
        b.price_change
            .total_cmp(&a.price_change)
            .then_with(|| a.item_number.cmp(&b.item_number))
    });
    changes.truncate(limit);
    changes
}

/// Items whose latest price is below their first, largest drop first
pub fn get_price_decreases(receipts: &[Receipt], limit: usize) -> Vec<PriceChange> {
    let mut changes: Vec<PriceChange> = price_changes(receipts)
        .into_iter()
        .filter(|c| c.price_change < 0.0)
        .collect();
    changes.sort_by(|a, b| {
        a.price_change
            .total_cmp(&b.price_change)
            .then_with(|| a.item_number.cmp(&b.item_number))
    });
    changes.truncate(limit);
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_receipt;
    use serde_json::{json, Value};

    fn receipt(number: u32, when: &str, kind: &str, items: Value) -> Receipt {
        let total: f64 = items
            .as_array()
            .map(|a| a.iter().filter_map(|i| i["amount"].as_f64()).sum())
            .unwrap_or(0.0);
        normalize_receipt(
            &json!({"warehouseNumber": 1, "transactionNumber": number, "transactionDateTime": when,
                    "transactionType": kind, "total": total, "itemArray": items}),
            0,
            "t.json",
        )
    }

    fn line(number: &str, name: &str, amount: f64, unit: f64) -> Value {
        json!({"itemNumber": number, "itemDescription01": name, "amount": amount, "unit": unit})
    }

    fn sample() -> Vec<Receipt> {
        vec![
            receipt(1, "2024-01-01T10:00:00", "Sales", json!([
                line("X", "COFFEE", 3.0, 1.0),
                line("Y", "TV", 500.0, 1.0),
                line("Z", "EGGS", 12.0, 2.0),
                json!({"itemNumber": "D1", "itemDescription01": "/55555", "amount": -1.0, "unit": 0})
            ])),
            receipt(2, "2024-03-01T10:00:00", "Sales", json!([
                line("X", "COFFEE", 3.5, 1.0),
                line("Z", "EGGS", 10.0, 2.0)
            ])),
            receipt(3, "2024-03-02T10:00:00", "Sales", json!([line("X", "COFFEE", 3.5, 1.0)])),
            receipt(4, "2024-03-10T10:00:00", "Refund", json!([line("Y", "Y", -500.0, -1.0)])),
        ]
    }

    #[test]
    fn test_summary_skips_discounts_and_tracks_prices() {
        let summaries = summarize_items(&sample());
        assert!(summaries.iter().all(|s| s.item_number != "D1"));

        let coffee = summaries.iter().find(|s| s.item_number == "X").unwrap();
        assert_eq!(coffee.name, "COFFEE");
        assert_eq!(coffee.purchase_count, 3);
        assert_eq!(coffee.total_quantity, 3.0);
        assert_eq!(coffee.total_spent, 10.0);
        assert_eq!(coffee.first_price, 3.0);
        assert_eq!(coffee.last_price, 3.5);
        assert_eq!(coffee.min_price, 3.0);
        assert_eq!(coffee.max_price, 3.5);
        assert_eq!(coffee.price_trend, 0.5);

        let tv = summaries.iter().find(|s| s.item_number == "Y").unwrap();
        // Refund never enters the price history
        assert_eq!(tv.price_history.len(), 1);
        assert_eq!(tv.name, "TV");
        assert_eq!(tv.total_spent, 0.0);
        assert_eq!(tv.total_quantity, 0.0);
        assert_eq!(tv.refund_count, 1);
    }

    #[test]
    fn test_top_items_drop_refunded() {
        let top = get_top_items(&sample(), 10, TopItemSort::Spending);
        let numbers: Vec<_> = top.iter().map(|i| i.item_number.as_str()).collect();
        assert_eq!(numbers, vec!["Z", "X"]);
    }

    #[test]
    fn test_top_items_sorts() {
        let by_quantity = get_top_items(&sample(), 1, TopItemSort::Quantity);
        assert_eq!(by_quantity[0].item_number, "Z");

        let by_frequency = get_frequent_items(&sample(), 1);
        assert_eq!(by_frequency[0].item_number, "X");
    }

    #[test]
    fn test_most_expensive() {
        let items = get_most_expensive_items(&sample(), 2);
        assert_eq!(items[0].item_number, "Z");
        assert_eq!(items[0].max_price, 6.0);
        assert_eq!(items[1].item_number, "X");
    }

    #[test]
    fn test_price_increase_and_decrease() {
        let increases = get_price_increases(&sample(), 10);
        assert_eq!(increases.len(), 1);
        assert_eq!(increases[0].item_number, "X");
        assert_eq!(increases[0].price_change, 0.5);
        assert_eq!(increases[0].percent_change, 16.67);

        let decreases = get_price_decreases(&sample(), 10);
        assert_eq!(decreases.len(), 1);
        assert_eq!(decreases[0].item_number, "Z");
        assert_eq!(decreases[0].price_change, -1.0);
    }

    #[test]
    fn test_single_purchase_has_no_trend() {
        let receipts = vec![receipt(1, "2024-01-01T10:00:00", "Sales", json!([line("Q", "Q", 4.0, 1.0)]))];
        assert!(get_price_increases(&receipts, 10).is_empty());
        assert!(get_price_decreases(&receipts, 10).is_empty());
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!("Quantity".parse::<TopItemSort>().unwrap(), TopItemSort::Quantity);
        assert_eq!("frequency".parse::<TopItemSort>().unwrap(), TopItemSort::Frequency);
        assert_eq!(TopItemSort::default(), TopItemSort::Spending);
        assert!("price".parse::<TopItemSort>().is_err());
    }
}

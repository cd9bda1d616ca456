//! In-memory receipt store
//!
//! Holds the canonical receipt collection plus derived indexes: item number
//! → occurrences, the warehouse list, and the overall date range. Indexes are
//! rebuilt in full whenever receipts are added; ingestion is a batch
//! operation over at most tens of thousands of receipts.
//!
//! The store is a plain value. Callers own it and pass it where needed; a
//! caller that adds parallel ingestion must serialize calls to
//! [`ReceiptStore::add_receipts`].

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::filter::ReceiptFilter;
use crate::models::{Channel, Item, Receipt, ONLINE_WAREHOUSE};

/// An item line annotated with the receipt it appeared on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemOccurrence {
    pub receipt_id: String,
    pub date: Option<NaiveDateTime>,
    pub warehouse_number: String,
    pub warehouse_name: String,
    pub channel: Channel,
    pub is_refund: bool,
    pub item: Item,
}

/// A warehouse seen in the data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarehouseRef {
    /// Warehouse number, or "ONLINE" for online orders
    pub key: String,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub receipt_count: usize,
}

#[derive(Debug, Default)]
pub struct ReceiptStore {
    receipts: Vec<Receipt>,
    item_index: HashMap<String, Vec<ItemOccurrence>>,
    warehouses: Vec<WarehouseRef>,
    date_range: Option<(NaiveDateTime, NaiveDateTime)>,
    version: u64,
}

impl ReceiptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append receipts and rebuild every index
    pub fn add_receipts(&mut self, receipts: Vec<Receipt>) {
        let added = receipts.len();
        self.receipts.extend(receipts);
        self.rebuild_indexes();
        self.version += 1;
        debug!(
            "Store now holds {} receipts ({} added, version {})",
            self.receipts.len(),
            added,
            self.version
        );
    }

    fn rebuild_indexes(&mut self) {
        let mut item_index: HashMap<String, Vec<ItemOccurrence>> = HashMap::new();
        let mut warehouses: BTreeMap<String, WarehouseRef> = BTreeMap::new();
        let mut date_range: Option<(NaiveDateTime, NaiveDateTime)> = None;

        for receipt in &self.receipts {
            let is_refund = receipt.is_refund();

            for item in &receipt.items {
                item_index
                    .entry(item.item_number.clone())
                    .or_default()
                    .push(ItemOccurrence {
                        receipt_id: receipt.id.clone(),
                        date: receipt.transaction_date_time,
                        warehouse_number: receipt.warehouse_number.clone(),
                        warehouse_name: receipt.warehouse_name.clone(),
                        channel: receipt.channel,
                        is_refund,
                        item: item.clone(),
                    });
            }

            let key = receipt.warehouse_key().to_string();
            warehouses
                .entry(key.clone())
                .or_insert_with(|| WarehouseRef {
                    name: if key == ONLINE_WAREHOUSE {
                        "Online".to_string()
                    } else {
                        receipt.warehouse_name.clone()
                    },
                    key,
                    city: receipt.warehouse_city.clone(),
                    state: receipt.warehouse_state.clone(),
                    receipt_count: 0,
                })
                .receipt_count += 1;

            if let Some(dt) = receipt.transaction_date_time {
                date_range = Some(match date_range {
                    None => (dt, dt),
                    Some((lo, hi)) => (lo.min(dt), hi.max(dt)),
                });
            }
        }

        for occurrences in item_index.values_mut() {
            occurrences.sort_by_key(|o| o.date);
        }

        self.item_index = item_index;
        self.warehouses = warehouses.into_values().collect();
        self.date_range = date_range;
    }

    /// Every receipt in insertion order
    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    /// Receipts matching the filter, re-evaluated against current contents
    pub fn filtered(&self, filter: &ReceiptFilter) -> Vec<Receipt> {
        filter.apply(&self.receipts)
    }

    /// Occurrences of an item across all receipts, oldest first
    pub fn items_by_number(&self, item_number: &str) -> &[ItemOccurrence] {
        self.item_index
            .get(item_number)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Warehouses sorted by key
    pub fn warehouses(&self) -> &[WarehouseRef] {
        &self.warehouses
    }

    /// Earliest and latest transaction timestamps
    pub fn date_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        self.date_range
    }

    /// Bumped on every mutation; lets callers cache derived results
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }

    /// Drop all receipts and indexes
    pub fn clear(&mut self) {
        self.receipts.clear();
        self.item_index.clear();
        self.warehouses.clear();
        self.date_range = None;
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::WarehouseFilter;
    use crate::normalize::normalize_receipt;
    use serde_json::json;

    fn receipts() -> Vec<Receipt> {
        vec![
            normalize_receipt(
                &json!({"warehouseNumber": 1, "warehouseName": "SEATTLE", "transactionNumber": 1,
                        "transactionDateTime": "2024-02-01T09:00:00", "transactionType": "Sales", "total": 5.0,
                        "itemArray": [{"itemNumber": "100", "itemDescription01": "MILK", "amount": 5.0, "unit": 1}]}),
                0,
                "a.json",
            ),
            normalize_receipt(
                &json!({"warehouseNumber": 1, "warehouseName": "SEATTLE", "transactionNumber": 2,
                        "transactionDateTime": "2024-01-01T09:00:00", "transactionType": "Sales", "total": 4.5,
                        "itemArray": [{"itemNumber": "100", "itemDescription01": "MILK", "amount": 4.5, "unit": 1}]}),
                1,
                "a.json",
            ),
            normalize_receipt(
                &json!({"warehouseNumber": 847, "orderNumber": "X1", "orderPlacedDate": "2024-03-05",
                        "channel": "online", "transactionType": "Sales", "total": 20.0,
                        "itemArray": [{"itemNumber": "200", "itemName": "Towels", "amount": 20.0, "unit": "EA"}]}),
                0,
                "b.json",
            ),
        ]
    }

    #[test]
    fn test_add_builds_indexes() {
        let mut store = ReceiptStore::new();
        assert!(store.is_empty());
        store.add_receipts(receipts());

        assert_eq!(store.len(), 3);
        assert_eq!(store.version(), 1);

        let milk = store.items_by_number("100");
        assert_eq!(milk.len(), 2);
        // Sorted oldest first
        assert_eq!(milk[0].item.amount, 4.5);
        assert_eq!(milk[1].warehouse_name, "SEATTLE");
        assert!(store.items_by_number("nope").is_empty());

        let keys: Vec<_> = store.warehouses().iter().map(|w| w.key.as_str()).collect();
        assert_eq!(keys, vec!["1", "ONLINE"]);
        assert_eq!(store.warehouses()[0].receipt_count, 2);
        assert_eq!(store.warehouses()[1].name, "Online");

        let (lo, hi) = store.date_range().unwrap();
        assert_eq!(lo.to_string(), "2024-01-01 09:00:00");
        assert_eq!(hi.to_string(), "2024-03-05 00:00:00");
    }

    #[test]
    fn test_incremental_add_rebuilds() {
        let mut store = ReceiptStore::new();
        let mut all = receipts();
        let online = all.pop().unwrap();
        store.add_receipts(all);
        assert!(store.items_by_number("200").is_empty());

        store.add_receipts(vec![online]);
        assert_eq!(store.items_by_number("200").len(), 1);
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn test_filtered_reads_latest_contents() {
        let mut store = ReceiptStore::new();
        let mut filter = ReceiptFilter::new();
        filter.set_warehouse(Some(WarehouseFilter::Online));
        assert!(store.filtered(&filter).is_empty());

        store.add_receipts(receipts());
        assert_eq!(store.filtered(&filter).len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut store = ReceiptStore::new();
        store.add_receipts(receipts());
        store.clear();
        assert!(store.is_empty());
        assert!(store.warehouses().is_empty());
        assert!(store.date_range().is_none());
        assert!(store.items_by_number("100").is_empty());
        assert_eq!(store.version(), 2);
    }
}

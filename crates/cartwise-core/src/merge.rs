//! Receipt deduplication across overlapping exports
//!
//! The same receipt often appears in several downloaded files. Receipts are
//! keyed by the vendor transaction barcode when present, otherwise by the
//! normalized id. On a collision the receipt with more item lines wins; the
//! loser is discarded whole, including any non-item fields only it carried.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::models::Receipt;

/// Merge batches of receipts into one unique set.
///
/// Output follows first-seen key order. Ties on item count keep the receipt
/// seen first. Cancelled receipts are dropped after merging.
pub fn merge_receipts(batches: Vec<Vec<Receipt>>) -> Vec<Receipt> {
    let mut slots: Vec<Receipt> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();
    let mut duplicates = 0usize;

    for receipt in batches.into_iter().flatten() {
        let key = receipt.dedup_key().to_string();
        match by_key.get(&key) {
            Some(&slot) => {
                duplicates += 1;
                if receipt.items.len() > slots[slot].items.len() {
                    debug!(
                        "Replacing {} ({} items) with more complete copy ({} items)",
                        key,
                        slots[slot].items.len(),
                        receipt.items.len()
                    );
                    slots[slot] = receipt;
                }
            }
            None => {
                by_key.insert(key, slots.len());
                slots.push(receipt);
            }
        }
    }

    let before = slots.len();
    slots.retain(|r| !r.is_cancelled());
    let cancelled = before - slots.len();

    info!(
        "Merged {} unique receipts ({} duplicates, {} cancelled dropped)",
        slots.len(),
        duplicates,
        cancelled
    );

    slots
}

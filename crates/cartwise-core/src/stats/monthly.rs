//! Monthly spending time series

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Channel, Receipt};
use crate::money::round_cents;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySpending {
    /// `YYYY-MM`
    pub month: String,
    pub receipt_count: usize,
    pub trip_count: usize,
    /// Net spend for the month
    pub total: f64,
    pub gross: f64,
    /// Refunded amount, <= 0
    pub refunds: f64,
    pub taxes: f64,
    pub savings: f64,
}

#[derive(Default)]
struct Month {
    receipt_count: usize,
    trip_days: HashSet<NaiveDate>,
    gross: f64,
    refunds: f64,
    taxes: f64,
    savings: f64,
}

/// Spending grouped by calendar month, oldest first. Undated receipts are skipped.
pub fn get_monthly_spending(receipts: &[Receipt]) -> Vec<MonthlySpending> {
    let mut months: BTreeMap<String, Month> = BTreeMap::new();

    for receipt in receipts {
        let Some(dt) = receipt.transaction_date_time else {
            continue;
        };
        let month = months.entry(dt.format("%Y-%m").to_string()).or_default();
        month.receipt_count += 1;
        if receipt.channel == Channel::Warehouse {
            month.trip_days.insert(dt.date());
        }
        if receipt.is_refund() {
            month.refunds -= receipt.total.abs();
        } else {
            month.gross += receipt.total;
        }
        month.taxes += receipt.signed(receipt.taxes);
        month.savings += receipt.signed(receipt.instant_savings);
    }

    months
        .into_iter()
        .map(|(key, m)| MonthlySpending {
            month: key,
            receipt_count: m.receipt_count,
            trip_count: m.trip_days.len(),
            total: round_cents(m.gross + m.refunds),
            gross: round_cents(m.gross),
            refunds: round_cents(m.refunds),
            taxes: round_cents(m.taxes),
            savings: round_cents(m.savings),
        })
        .collect()
}

//! Headline totals and averages

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Channel, Item, Receipt};
use crate::money::round_cents;

/// Headline totals over a receipt set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub total_receipts: usize,
    pub sale_receipts: usize,
    pub refund_receipts: usize,
    /// Sum of non-refund receipt totals
    pub gross_spent: f64,
    /// Sum of refund receipt totals, always <= 0
    pub refund_spent: f64,
    /// `gross_spent + refund_spent`
    pub net_spent: f64,
    /// Magnitude of `refund_spent`
    pub refund_amount: f64,
    pub total_taxes: f64,
    pub instant_savings: f64,
    /// Distinct item numbers ever purchased
    pub unique_items: usize,
    /// Distinct item numbers whose lifetime net quantity is still positive
    pub net_unique_items: usize,
    /// Units purchased on non-refund receipts
    pub purchase_count: f64,
    /// Amount spent on purchased lines (before discounts and tax)
    pub gross_item_spend: f64,
    pub avg_price_per_item: f64,
    pub discount_count: usize,
    pub return_count: usize,
}

/// Average spend figures
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Averages {
    pub per_receipt: f64,
    pub per_trip: f64,
    pub per_month: f64,
    pub items_per_receipt: f64,
    pub trip_count: usize,
    pub month_count: usize,
}

/// Quantity an item line counts for. Weighed lines can carry a unit of 0;
/// they still represent one unit in the direction of their amount.
pub(crate) fn line_units(item: &Item) -> f64 {
    if item.quantity != 0.0 {
        item.quantity
    } else if item.amount < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Distinct calendar days with an in-person warehouse visit
pub(crate) fn trip_days<'a, I>(receipts: I) -> HashSet<NaiveDate>
where
    I: IntoIterator<Item = &'a Receipt>,
{
    receipts
        .into_iter()
        .filter(|r| r.channel == Channel::Warehouse)
        .filter_map(Receipt::date)
        .collect()
}

/// Compute headline totals.
///
/// Refund receipts contribute the negated magnitude of their taxes, savings
/// and quantities. Money is accumulated unrounded and rounded once at the end.
pub fn calculate_totals(receipts: &[Receipt]) -> Totals {
    let mut totals = Totals {
        total_receipts: receipts.len(),
        ..Default::default()
    };

    let mut gross = 0.0;
    let mut refund_spent = 0.0;
    let mut taxes = 0.0;
    let mut savings = 0.0;
    let mut item_spend = 0.0;
    let mut units = 0.0;
    let mut purchased: HashSet<&str> = HashSet::new();
    let mut net_quantity: HashMap<&str, f64> = HashMap::new();

    for receipt in receipts {
        let refund = receipt.is_refund();
        if refund {
            totals.refund_receipts += 1;
            refund_spent -= receipt.total.abs();
        } else {
            totals.sale_receipts += 1;
            gross += receipt.total;
        }
        taxes += receipt.signed(receipt.taxes);
        savings += receipt.signed(receipt.instant_savings);

        for item in &receipt.items {
            if item.is_discount {
                totals.discount_count += 1;
                continue;
            }
            if item.is_return {
                totals.return_count += 1;
            }

            *net_quantity.entry(item.item_number.as_str()).or_default() +=
                receipt.signed(line_units(item));

            if !refund && item.is_purchase() {
                purchased.insert(item.item_number.as_str());
                units += line_units(item);
                item_spend += item.amount;
            }
        }
    }

    totals.gross_spent = round_cents(gross);
    totals.refund_spent = round_cents(refund_spent);
    totals.net_spent = round_cents(gross + refund_spent);
    totals.refund_amount = round_cents(refund_spent.abs());
    totals.total_taxes = round_cents(taxes);
    totals.instant_savings = round_cents(savings);
    totals.unique_items = purchased.len();
    totals.net_unique_items = net_quantity.values().filter(|q| **q > 1e-9).count();
    totals.purchase_count = units;
    totals.gross_item_spend = round_cents(item_spend);
    totals.avg_price_per_item = if units > 0.0 {
        round_cents(item_spend / units)
    } else {
        0.0
    };

    totals
}

/// Compute per-receipt, per-trip and per-month averages
pub fn calculate_averages(receipts: &[Receipt]) -> Averages {
    let totals = calculate_totals(receipts);
    let trips = trip_days(receipts).len();
    let months: HashSet<String> = receipts
        .iter()
        .filter_map(|r| r.transaction_date_time)
        .map(|dt| dt.format("%Y-%m").to_string())
        .collect();

    let divide = |amount: f64, count: usize| {
        if count == 0 {
            0.0
        } else {
            round_cents(amount / count as f64)
        }
    };

    Averages {
        per_receipt: divide(totals.gross_spent, totals.sale_receipts),
        per_trip: divide(
            totals.net_spent,
            if trips > 0 { trips } else { receipts.len() },
        ),
        per_month: divide(totals.net_spent, months.len()),
        items_per_receipt: if totals.sale_receipts == 0 {
            0.0
        } else {
            (totals.purchase_count / totals.sale_receipts as f64 * 10.0).round() / 10.0
        },
        trip_count: trips,
        month_count: months.len(),
    }
}

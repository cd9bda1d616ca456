//! Per-warehouse rollups

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::models::{Channel, Receipt, ONLINE_WAREHOUSE};
use crate::money::round_cents;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehouseStats {
    /// Warehouse number, or "ONLINE"
    pub warehouse_number: String,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub receipt_count: usize,
    /// Net spend (refunds subtracted)
    pub total_spent: f64,
    /// Distinct days with a non-gas receipt
    pub trip_count: usize,
    pub gas_visits: usize,
    pub avg_per_trip: f64,
    pub first_visit: Option<NaiveDateTime>,
    pub last_visit: Option<NaiveDateTime>,
}

#[derive(Default)]
struct Group {
    name: String,
    city: Option<String>,
    state: Option<String>,
    receipt_count: usize,
    total: f64,
    trip_days: HashSet<NaiveDate>,
    gas_visits: usize,
    first_visit: Option<NaiveDateTime>,
    last_visit: Option<NaiveDateTime>,
}

/// Group receipts by warehouse, sorted by total spent descending.
///
/// Online orders collapse into one "ONLINE" group whose trips are order days.
pub fn get_warehouse_stats(receipts: &[Receipt]) -> Vec<WarehouseStats> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Group> = HashMap::new();

    for receipt in receipts {
        let key = receipt.warehouse_key().to_string();
        let group = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            Group {
                name: if key == ONLINE_WAREHOUSE {
                    "Online".to_string()
                } else {
                    receipt.warehouse_name.clone()
                },
                ..Default::default()
            }
        });

        group.receipt_count += 1;
        group.total += receipt.signed(receipt.total);
        if group.city.is_none() {
            group.city = receipt.warehouse_city.clone();
        }
        if group.state.is_none() {
            group.state = receipt.warehouse_state.clone();
        }

        if receipt.channel == Channel::GasStation {
            group.gas_visits += 1;
        } else if let Some(day) = receipt.date() {
            group.trip_days.insert(day);
        }

        if let Some(dt) = receipt.transaction_date_time {
            group.first_visit = Some(group.first_visit.map_or(dt, |v| v.min(dt)));
            group.last_visit = Some(group.last_visit.map_or(dt, |v| v.max(dt)));
        }
    }

    let mut stats: Vec<WarehouseStats> = order
        .into_iter()
        .filter_map(|key| groups.remove(&key).map(|g| (key, g)))
        .map(|(key, g)| {
            let trip_count = g.trip_days.len();
            let divisor = if trip_count > 0 {
                trip_count
            } else {
                g.receipt_count
            };
            WarehouseStats {
                warehouse_number: key,
                name: g.name,
                city: g.city,
                state: g.state,
                receipt_count: g.receipt_count,
                total_spent: round_cents(g.total),
                trip_count,
                gas_visits: g.gas_visits,
                avg_per_trip: if divisor == 0 {
                    0.0
                } else {
                    round_cents(g.total / divisor as f64)
                },
                first_visit: g.first_visit,
                last_visit: g.last_visit,
            }
        })
        .collect();

    stats.sort_by(|a, b| b.total_spent.total_cmp(&a.total_spent));
    stats
}

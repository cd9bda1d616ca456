//! Executive membership reward simulation
//!
//! Members earn 2% back on qualifying purchases, capped per cycle year. A
//! cycle starts on a configurable month and day, so a cycle year is the
//! calendar year of the most recent cycle start on or before a purchase.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::departments::DEFAULT_REWARD_EXCLUSIONS;
use crate::models::{Channel, Receipt};
use crate::money::round_cents;

pub const REWARD_RATE: f64 = 0.02;
pub const REWARD_CAP: f64 = 1250.0;

/// Reward cycle settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardsConfig {
    pub cycle_start_month: u32,
    pub cycle_start_day: u32,
    /// Departments excluded on top of the defaults
    pub additional_excluded_departments: Vec<u32>,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            cycle_start_month: 1,
            cycle_start_day: 1,
            additional_excluded_departments: Vec::new(),
        }
    }
}

impl RewardsConfig {
    /// Default exclusions plus configured extras, sorted and deduplicated
    pub fn excluded_departments(&self) -> Vec<u32> {
        let mut departments: Vec<u32> = DEFAULT_REWARD_EXCLUSIONS
            .iter()
            .chain(self.additional_excluded_departments.iter())
            .copied()
            .collect();
        departments.sort_unstable();
        departments.dedup();
        departments
    }
}

/// Reward earned on a qualifying subtotal
pub fn reward_for(qualifying: f64) -> f64 {
    (qualifying * REWARD_RATE).min(REWARD_CAP)
}

/// Cycle start in `year`. Days past the end of the month clamp to its last day.
pub fn cycle_start(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let month = month.clamp(1, 12);
    let mut day = day.clamp(1, 31);
    loop {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
        if day <= 28 {
            return None;
        }
        day -= 1;
    }
}

/// Cycle year a date falls in
pub fn cycle_year(date: NaiveDate, month: u32, day: u32) -> i32 {
    match cycle_start(date.year(), month, day) {
        Some(start) if date < start => date.year() - 1,
        _ => date.year(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewardCycle {
    pub cycle_year: i32,
    pub start: Option<NaiveDate>,
    /// Last day of the cycle
    pub end: Option<NaiveDate>,
    pub receipt_count: usize,
    pub qualifying_spend: f64,
    /// Spend on excluded departments
    pub excluded_spend: f64,
    pub reward: f64,
    pub capped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewardsSummary {
    pub cycle_start_month: u32,
    pub cycle_start_day: u32,
    pub excluded_departments: Vec<u32>,
    /// Oldest cycle first
    pub cycles: Vec<RewardCycle>,
    pub total_qualifying: f64,
    pub total_reward: f64,
    /// Receipts that never earn rewards (gas, travel, negative total, undated)
    pub skipped_receipts: usize,
}

#[derive(Default)]
struct CycleAcc {
    receipts: usize,
    qualifying: f64,
    excluded: f64,
}

fn earns_rewards(receipt: &Receipt) -> bool {
    receipt.channel != Channel::GasStation && !receipt.is_travel && receipt.total >= 0.0
}

/// Simulate rewards for every cycle year present in `receipts`
pub fn calculate_executive_rewards(receipts: &[Receipt], config: &RewardsConfig) -> RewardsSummary {
    let excluded = config.excluded_departments();
    let month = config.cycle_start_month;
    let day = config.cycle_start_day;

    let mut cycles: BTreeMap<i32, CycleAcc> = BTreeMap::new();
    let mut skipped = 0usize;

    for receipt in receipts {
        let date = match receipt.date() {
            Some(date) if earns_rewards(receipt) => date,
            _ => {
                skipped += 1;
                continue;
            }
        };

        let acc = cycles.entry(cycle_year(date, month, day)).or_default();
        acc.receipts += 1;
        for item in receipt.items.iter().filter(|i| !i.is_discount) {
            let is_excluded = item
                .department_number
                .map(|d| excluded.binary_search(&d).is_ok())
                .unwrap_or(false);
            if is_excluded {
                acc.excluded += item.amount;
            } else {
                acc.qualifying += item.amount;
            }
        }
    }

    let cycles: Vec<RewardCycle> = cycles
        .into_iter()
        .map(|(year, acc)| {
            let start = cycle_start(year, month, day);
            let end = cycle_start(year + 1, month, day).and_then(|next| next.pred_opt());
            let raw_reward = acc.qualifying * REWARD_RATE;
            RewardCycle {
                cycle_year: year,
                start,
                end,
                receipt_count: acc.receipts,
                qualifying_spend: round_cents(acc.qualifying),
                excluded_spend: round_cents(acc.excluded),
                reward: round_cents(reward_for(acc.qualifying)),
                capped: raw_reward > REWARD_CAP,
            }
        })
        .collect();

    let total_qualifying = round_cents(cycles.iter().map(|c| c.qualifying_spend).sum());
    let total_reward = round_cents(cycles.iter().map(|c| c.reward).sum());
    debug!(
        "Rewards over {} cycles: {} qualifying, {} earned, {} receipts skipped",
        cycles.len(),
        total_qualifying,
        total_reward,
        skipped
    );

    RewardsSummary {
        cycle_start_month: month,
        cycle_start_day: day,
        excluded_departments: excluded,
        cycles,
        total_qualifying,
        total_reward,
        skipped_receipts: skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_receipt;
    use serde_json::{json, Value};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn receipt(number: u32, when: &str, total: f64, items: Value) -> Receipt {
        normalize_receipt(
            &json!({"warehouseNumber": 1, "transactionNumber": number, "transactionDateTime": when,
                    "transactionType": "Sales", "total": total, "itemArray": items}),
            0,
            "t.json",
        )
    }

    #[test]
    fn test_reward_cap() {
        assert_eq!(reward_for(0.0), 0.0);
        assert!((reward_for(1000.0) - 20.0).abs() < 1e-9);
        assert_eq!(reward_for(62_500.0), 1250.0);
        assert_eq!(reward_for(1_000_000.0), 1250.0);
    }

    #[test]
    fn test_reward_monotonic() {
        let mut previous = 0.0;
        for step in 0..200 {
            let reward = reward_for(step as f64 * 500.0);
            assert!(reward >= previous);
            assert!(reward <= REWARD_CAP);
            previous = reward;
        }
    }

    #[test]
    fn test_cycle_year_boundary() {
        assert_eq!(cycle_year(date(2024, 3, 15), 3, 15), 2024);
        assert_eq!(cycle_year(date(2024, 3, 14), 3, 15), 2023);
        assert_eq!(cycle_year(date(2024, 1, 1), 1, 1), 2024);
        assert_eq!(cycle_year(date(2023, 12, 31), 1, 1), 2023);
    }

    #[test]
    fn test_cycle_start_clamps_short_months() {
        assert_eq!(cycle_start(2023, 2, 30), Some(date(2023, 2, 28)));
        assert_eq!(cycle_start(2024, 2, 30), Some(date(2024, 2, 29)));
        assert_eq!(cycle_start(2024, 4, 31), Some(date(2024, 4, 30)));
    }

    #[test]
    fn test_excluded_departments_merge() {
        let config = RewardsConfig {
            additional_excluded_departments: vec![14, 93],
            ..Default::default()
        };
        assert_eq!(config.excluded_departments(), vec![14, 75, 93]);
    }

    #[test]
    fn test_rewards_by_cycle() {
        let receipts = vec![
            receipt(1, "2024-03-01T10:00:00", 110.0, json!([
                {"itemNumber": "A", "itemDescription01": "TV", "amount": 100.0, "unit": 1, "itemDepartmentNumber": 17},
                {"itemNumber": "GC", "itemDescription01": "GIFT CARD", "amount": 10.0, "unit": 1, "itemDepartmentNumber": 75},
                {"itemNumber": "D", "itemDescription01": "/12345", "amount": -5.0, "unit": 0}
            ])),
            receipt(2, "2024-02-28T10:00:00", 50.0, json!([
                {"itemNumber": "B", "itemDescription01": "RUG", "amount": 50.0, "unit": 1}
            ])),
        ];
        let config = RewardsConfig {
            cycle_start_month: 3,
            cycle_start_day: 1,
            ..Default::default()
        };
        let summary = calculate_executive_rewards(&receipts, &config);
        assert_eq!(summary.cycles.len(), 2);

        let first = &summary.cycles[0];
        assert_eq!(first.cycle_year, 2023);
        assert_eq!(first.qualifying_spend, 50.0);
        assert_eq!(first.reward, 1.0);
        assert_eq!(first.end, Some(date(2024, 2, 29)));

        let second = &summary.cycles[1];
        assert_eq!(second.cycle_year, 2024);
        // Discount line skipped, gift card excluded
        assert_eq!(second.qualifying_spend, 100.0);
        assert_eq!(second.excluded_spend, 10.0);
        assert_eq!(second.reward, 2.0);
        assert_eq!(summary.total_reward, 3.0);
    }

    #[test]
    fn test_skips_gas_travel_and_negative() {
        let receipts = vec![
            normalize_receipt(
                &json!({"warehouseNumber": 1, "transactionNumber": 1, "documentType": "FuelReceipts",
                        "transactionDateTime": "2024-01-01T10:00:00", "transactionType": "Sales", "total": 40.0,
                        "itemArray": [{"itemNumber": "G", "amount": 40.0, "unit": 1}]}),
                0,
                "t.json",
            ),
            normalize_receipt(
                &json!({"warehouseNumber": 1, "transactionNumber": 2, "receiptType": "Travel",
                        "transactionDateTime": "2024-01-02T10:00:00", "transactionType": "Sales", "total": 900.0,
                        "itemArray": [{"itemNumber": "T", "amount": 900.0, "unit": 1}]}),
                0,
                "t.json",
            ),
            receipt(3, "2024-01-03T10:00:00", -20.0, json!([
                {"itemNumber": "R", "itemDescription01": "RET", "amount": -20.0, "unit": -1}
            ])),
        ];
        let summary = calculate_executive_rewards(&receipts, &RewardsConfig::default());
        assert_eq!(summary.skipped_receipts, 3);
        assert!(summary.cycles.is_empty());
        assert_eq!(summary.total_reward, 0.0);
    }

    #[test]
    fn test_cap_applies_per_cycle() {
        let receipts = vec![receipt(1, "2024-05-01T10:00:00", 100_000.0, json!([
            {"itemNumber": "BIG", "itemDescription01": "BIG", "amount": 100_000.0, "unit": 1}
        ]))];
        let summary = calculate_executive_rewards(&receipts, &RewardsConfig::default());
        assert_eq!(summary.cycles[0].reward, REWARD_CAP);
        assert!(summary.cycles[0].capped);
    }
}

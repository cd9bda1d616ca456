//! Aggregator - statistics over a receipt set
//!
//! Every function here is a pure transform over `&[Receipt]`. Callers apply a
//! [`ReceiptFilter`](crate::filter::ReceiptFilter) first and hand the subset in;
//! nothing in this module knows about the store or the filter state.
//!
//! ## Sign rules
//!
//! Refund receipts always subtract: their totals, taxes, savings and item
//! quantities contribute the negated magnitude regardless of how the export
//! signed them. Money is accumulated unrounded and rounded to cents at the end.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cartwise_core::stats::{calculate_all, AnalysisOptions};
//!
//! let receipts = store.filtered(&filter);
//! let analysis = calculate_all(&receipts, &AnalysisOptions::default());
//! println!("net spend: {:.2}", analysis.totals.net_spent);
//! ```

pub mod items;
pub mod monthly;
pub mod rewards;
pub mod taxes;
pub mod totals;
pub mod warehouses;

pub use items::{
    get_frequent_items, get_most_expensive_items, get_price_decreases, get_price_increases,
    get_top_items, summarize_items, ItemSummary, PriceChange, PricePoint, TopItemSort,
};
pub use monthly::{get_monthly_spending, MonthlySpending};
pub use rewards::{
    calculate_executive_rewards, cycle_start, cycle_year, reward_for, RewardCycle, RewardsConfig,
    RewardsSummary, REWARD_CAP, REWARD_RATE,
};
pub use taxes::{tax_by_department, DepartmentTax};
pub use totals::{calculate_averages, calculate_totals, Averages, Totals};
pub use warehouses::{get_warehouse_stats, WarehouseStats};

use serde::Serialize;

use crate::models::Receipt;

/// Options for [`calculate_all`]
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    pub rewards: RewardsConfig,
}

/// The headline statistics bundle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub totals: Totals,
    pub averages: Averages,
    pub warehouses: Vec<WarehouseStats>,
    pub monthly: Vec<MonthlySpending>,
    pub rewards: RewardsSummary,
}

/// Compute totals, averages, warehouse, monthly and reward statistics in one call
pub fn calculate_all(receipts: &[Receipt], options: &AnalysisOptions) -> Analysis {
    Analysis {
        totals: calculate_totals(receipts),
        averages: calculate_averages(receipts),
        warehouses: get_warehouse_stats(receipts),
        monthly: get_monthly_spending(receipts),
        rewards: calculate_executive_rewards(receipts, &options.rewards),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_receipt;
    use serde_json::json;

    #[test]
    fn test_calculate_all_empty() {
        let analysis = calculate_all(&[], &AnalysisOptions::default());
        assert_eq!(analysis.totals.total_receipts, 0);
        assert!(analysis.warehouses.is_empty());
        assert!(analysis.monthly.is_empty());
        assert!(analysis.rewards.cycles.is_empty());
    }

    #[test]
    fn test_calculate_all_uses_reward_options() {
        let receipts = vec![normalize_receipt(
            &json!({"warehouseNumber": 1, "transactionNumber": 1, "transactionDateTime": "2024-06-01T10:00:00",
                    "transactionType": "Sales", "total": 100.0,
                    "itemArray": [{"itemNumber": "A", "itemDescription01": "A", "amount": 100.0, "unit": 1, "itemDepartmentNumber": 14}]}),
            0,
            "t.json",
        )];
        let options = AnalysisOptions {
            rewards: RewardsConfig {
                additional_excluded_departments: vec![14],
                ..Default::default()
            },
        };
        let analysis = calculate_all(&receipts, &options);
        assert_eq!(analysis.totals.net_spent, 100.0);
        assert_eq!(analysis.rewards.total_reward, 0.0);
        assert_eq!(analysis.monthly[0].month, "2024-06");
        assert_eq!(analysis.warehouses[0].trip_count, 1);
    }
}

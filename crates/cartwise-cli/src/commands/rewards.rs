//! Executive reward simulation command

use anyhow::{Context, Result};
use cartwise_core::stats::{calculate_executive_rewards, RewardsConfig, REWARD_CAP};

use super::core::Session;

/// Flag overrides layered over the configured reward cycle
#[derive(Debug, Clone, Default)]
pub struct RewardOverrides {
    pub cycle_month: Option<u32>,
    pub cycle_day: Option<u32>,
    pub exclude_departments: Vec<u32>,
}

pub fn resolve_rewards_config(
    session: &Session,
    overrides: &RewardOverrides,
) -> Result<RewardsConfig> {
    let mut config = session.config.clone();
    if let Some(month) = overrides.cycle_month {
        config.rewards.cycle_start_month = month;
    }
    if let Some(day) = overrides.cycle_day {
        config.rewards.cycle_start_day = day;
    }
    config
        .rewards
        .additional_excluded_departments
        .extend(overrides.exclude_departments.iter().copied());
    config.validate().context("Invalid reward cycle")?;
    Ok(config.rewards)
}

pub fn cmd_rewards(session: &Session, overrides: &RewardOverrides) -> Result<()> {
    let rewards_config = resolve_rewards_config(session, overrides)?;
    let receipts = session.receipts();
    let summary = calculate_executive_rewards(&receipts, &rewards_config);

    println!();
    println!("🎁 Executive Rewards");
    println!(
        "   Cycle starts {:02}/{:02}; excluded departments: {}",
        summary.cycle_start_month,
        summary.cycle_start_day,
        summary
            .excluded_departments
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!();

    if summary.cycles.is_empty() {
        println!("   No qualifying receipts match the current filter.");
        return Ok(());
    }

    println!(
        "   {:5} │ {:23} │ {:>12} │ {:>10} │ {:>9}",
        "Cycle", "Period", "Qualifying", "Excluded", "Reward"
    );
    println!("   ──────┼─────────────────────────┼──────────────┼────────────┼──────────");
    for cycle in &summary.cycles {
        let period = match (cycle.start, cycle.end) {
            (Some(start), Some(end)) => format!("{} - {}", start, end),
            _ => "-".to_string(),
        };
        println!(
            "   {:5} │ {:23} │ {:>12.2} │ {:>10.2} │ {:>9.2}{}",
            cycle.cycle_year,
            period,
            cycle.qualifying_spend,
            cycle.excluded_spend,
            cycle.reward,
            if cycle.capped { " (cap)" } else { "" }
        );
    }

    println!();
    println!(
        "   Total: ${:.2} (2% of qualifying spend, capped at ${:.0} per cycle)",
        summary.total_reward, REWARD_CAP
    );
    if summary.skipped_receipts > 0 {
        println!(
            "   {} receipt(s) skipped: gas, travel, refunds or undated",
            summary.skipped_receipts
        );
    }

    Ok(())
}

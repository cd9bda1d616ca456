//! Report command implementations

use anyhow::Result;
use cartwise_core::stats::{
    calculate_all, get_monthly_spending, get_warehouse_stats, tax_by_department,
};

use super::core::Session;
use super::truncate;

fn print_filter_line(session: &Session, shown: usize) {
    if session.filter.is_empty() {
        println!("   {} receipts", shown);
    } else {
        println!(
            "   {} of {} receipts (filtered, preset: {})",
            shown,
            session.store.len(),
            session.filter.preset
        );
    }
}

pub fn cmd_summary(session: &Session, json: bool) -> Result<()> {
    let receipts = session.receipts();
    let analysis = calculate_all(&receipts, &session.analysis_options());

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    let totals = &analysis.totals;
    let averages = &analysis.averages;

    println!();
    println!("📊 Spending Summary");
    print_filter_line(session, receipts.len());
    if let Some((first, last)) = session.store.date_range() {
        println!("   Data covers {} to {}", first.date(), last.date());
    }
    println!("   ─────────────────────────────────────────────");

    if receipts.is_empty() {
        println!("   No receipts match the current filter.");
        return Ok(());
    }

    println!("   Gross spent:        ${:>12.2}", totals.gross_spent);
    println!(
        "   Refunds:            ${:>12.2}  ({} receipts)",
        totals.refund_spent, totals.refund_receipts
    );
    println!("   Net spent:          ${:>12.2}", totals.net_spent);
    println!("   Taxes:              ${:>12.2}", totals.total_taxes);
    println!("   Instant savings:    ${:>12.2}", totals.instant_savings);
    println!();
    println!(
        "   Unique items:       {:>13}  ({} still owned)",
        totals.unique_items, totals.net_unique_items
    );
    println!("   Avg price per item: ${:>12.2}", totals.avg_price_per_item);
    println!(
        "   Per receipt:        ${:>12.2}  ({:.1} items)",
        averages.per_receipt, averages.items_per_receipt
    );
    println!(
        "   Per trip:           ${:>12.2}  ({} trips)",
        averages.per_trip, averages.trip_count
    );
    println!(
        "   Per month:          ${:>12.2}  ({} months)",
        averages.per_month, averages.month_count
    );

    if !analysis.warehouses.is_empty() {
        println!();
        println!("   Top warehouses:");
        for warehouse in analysis.warehouses.iter().take(3) {
            println!(
                "     {:28} ${:>10.2}",
                truncate(&warehouse.name, 28),
                warehouse.total_spent
            );
        }
    }

    println!();
    println!(
        "   🎁 Executive rewards: ${:.2} over {} cycle(s)",
        analysis.rewards.total_reward,
        analysis.rewards.cycles.len()
    );

    Ok(())
}

pub fn cmd_warehouses(session: &Session) -> Result<()> {
    let receipts = session.receipts();
    let stats = get_warehouse_stats(&receipts);

    println!();
    println!("🏬 Warehouses");
    print_filter_line(session, receipts.len());
    println!();

    if stats.is_empty() {
        println!("   No receipts match the current filter.");
        return Ok(());
    }

    println!(
        "   {:6} │ {:24} │ {:>10} │ {:>5} │ {:>8} │ {:>4} │ {:10}",
        "#", "Name", "Spent", "Trips", "Per trip", "Gas", "Last visit"
    );
    println!("   ───────┼──────────────────────────┼────────────┼───────┼──────────┼──────┼───────────");
    for w in &stats {
        println!(
            "   {:6} │ {:24} │ {:>10.2} │ {:>5} │ {:>8.2} │ {:>4} │ {:10}",
            truncate(&w.warehouse_number, 6),
            truncate(&w.name, 24),
            w.total_spent,
            w.trip_count,
            w.avg_per_trip,
            w.gas_visits,
            w.last_visit
                .map(|d| d.date().to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }

    Ok(())
}

pub fn cmd_monthly(session: &Session) -> Result<()> {
    let receipts = session.receipts();
    let monthly = get_monthly_spending(&receipts);

    println!();
    println!("📅 Monthly Spending");
    print_filter_line(session, receipts.len());
    println!();

    if monthly.is_empty() {
        println!("   No dated receipts match the current filter.");
        return Ok(());
    }

    println!(
        "   {:7} │ {:>10} │ {:>9} │ {:>8} │ {:>8} │ {:>5}",
        "Month", "Net", "Refunds", "Taxes", "Savings", "Trips"
    );
    println!("   ────────┼────────────┼───────────┼──────────┼──────────┼──────");
    for month in &monthly {
        println!(
            "   {:7} │ {:>10.2} │ {:>9.2} │ {:>8.2} │ {:>8.2} │ {:>5}",
            month.month, month.total, month.refunds, month.taxes, month.savings, month.trip_count
        );
    }

    Ok(())
}

pub fn cmd_taxes(session: &Session) -> Result<()> {
    let receipts = session.receipts();
    let taxes = tax_by_department(&receipts);

    println!();
    println!("🧾 Tax by Department (estimated)");
    print_filter_line(session, receipts.len());
    println!();

    if taxes.is_empty() {
        println!("   No taxed items match the current filter.");
        return Ok(());
    }

    let total: f64 = taxes.iter().map(|t| t.allocated_tax).sum();
    println!(
        "   {:28} │ {:>9} │ {:>10} │ {:>5}",
        "Department", "Tax", "Spend", "Items"
    );
    println!("   ─────────────────────────────┼───────────┼────────────┼──────");
    for dept in &taxes {
        println!(
            "   {:28} │ {:>9.2} │ {:>10.2} │ {:>5}",
            truncate(&dept.department_name, 28),
            dept.allocated_tax,
            dept.item_spend,
            dept.item_count
        );
    }
    println!();
    println!("   Total: ${:.2}", total);
    println!("   Receipts carry a single tax figure; shares are apportioned by item spend.");

    Ok(())
}

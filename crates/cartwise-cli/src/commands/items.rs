//! Item analytics commands

use std::collections::HashSet;

use anyhow::{anyhow, Result};
use cartwise_core::stats::{
    get_price_decreases, get_price_increases, get_top_items, summarize_items, TopItemSort,
};

use super::core::Session;
use super::truncate;

pub fn cmd_items(session: &Session, sort: &str, limit: Option<usize>) -> Result<()> {
    let sort: TopItemSort = sort.parse().map_err(|e: String| anyhow!(e))?;
    let limit = limit.unwrap_or(session.config.display.top_items);
    let receipts = session.receipts();
    let items = get_top_items(&receipts, limit, sort);

    println!();
    println!("🛒 Top Items by {}", sort);
    println!();

    if items.is_empty() {
        println!("   No purchased items match the current filter.");
        return Ok(());
    }

    println!(
        "   {:10} │ {:32} │ {:>10} │ {:>6} │ {:>6} │ {:>8}",
        "Item #", "Name", "Spent", "Qty", "Buys", "Trend"
    );
    println!("   ───────────┼──────────────────────────────────┼────────────┼────────┼────────┼─────────");
    for item in &items {
        println!(
            "   {:10} │ {:32} │ {:>10.2} │ {:>6} │ {:>6} │ {:>+8.2}",
            truncate(&item.item_number, 10),
            truncate(&item.name, 32),
            item.total_spent,
            item.total_quantity,
            item.purchase_count,
            item.price_trend
        );
    }

    Ok(())
}

pub fn cmd_prices(session: &Session, decreases: bool, limit: Option<usize>) -> Result<()> {
    let limit = limit.unwrap_or(session.config.display.top_items);
    let receipts = session.receipts();
    let changes = if decreases {
        get_price_decreases(&receipts, limit)
    } else {
        get_price_increases(&receipts, limit)
    };

    println!();
    if decreases {
        println!("📉 Price Decreases");
    } else {
        println!("📈 Price Increases");
    }
    println!();

    if changes.is_empty() {
        println!("   No items bought at least twice with a price change.");
        return Ok(());
    }

    println!(
        "   {:10} │ {:30} │ {:>8} │ {:>8} │ {:>8} │ {:>7}",
        "Item #", "Name", "First", "Latest", "Change", "%"
    );
    println!("   ───────────┼────────────────────────────────┼──────────┼──────────┼──────────┼────────");
    for change in &changes {
        println!(
            "   {:10} │ {:30} │ {:>8.2} │ {:>8.2} │ {:>+8.2} │ {:>+6.1}%",
            truncate(&change.item_number, 10),
            truncate(&change.name, 30),
            change.first_price,
            change.last_price,
            change.price_change,
            change.percent_change
        );
    }

    Ok(())
}

pub fn cmd_item(session: &Session, number: &str) -> Result<()> {
    let receipts = session.receipts();
    let visible: HashSet<&str> = receipts.iter().map(|r| r.id.as_str()).collect();
    let occurrences: Vec<_> = session
        .store
        .items_by_number(number)
        .iter()
        .filter(|o| visible.contains(o.receipt_id.as_str()))
        .collect();

    if occurrences.is_empty() {
        anyhow::bail!("Item {} not found in the selected receipts", number);
    }

    let summary = summarize_items(&receipts)
        .into_iter()
        .find(|s| s.item_number == number);

    println!();
    match &summary {
        Some(s) => println!("📦 {} ({})", s.name, number),
        None => println!("📦 Item {}", number),
    }
    if let Some(s) = &summary {
        if let Some(dept) = &s.department_name {
            println!("   Department: {}", dept);
        }
        println!(
            "   Bought {} time(s), refunded {}; net spend ${:.2}",
            s.purchase_count, s.refund_count, s.total_spent
        );
        if s.purchase_count > 0 {
            println!(
                "   Price range ${:.2} - ${:.2}, trend {:+.2}",
                s.min_price, s.max_price, s.price_trend
            );
        }
    }
    println!();

    println!(
        "   {:10} │ {:20} │ {:>6} │ {:>9} │ {:>9} │ {:6}",
        "Date", "Warehouse", "Qty", "Amount", "Unit", "Kind"
    );
    println!("   ───────────┼──────────────────────┼────────┼───────────┼───────────┼───────");
    for occurrence in occurrences {
        let kind = if occurrence.item.is_discount {
            "disc"
        } else if occurrence.is_refund || occurrence.item.is_return {
            "return"
        } else {
            "buy"
        };
        println!(
            "   {:10} │ {:20} │ {:>6} │ {:>9.2} │ {:>9.2} │ {:6}",
            occurrence
                .date
                .map(|d| d.date().to_string())
                .unwrap_or_else(|| "-".to_string()),
            truncate(&occurrence.warehouse_name, 20),
            occurrence.item.quantity,
            occurrence.item.amount,
            occurrence.item.unit_price,
            kind
        );
    }

    Ok(())
}

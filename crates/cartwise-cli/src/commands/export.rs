//! CSV export command

use std::path::Path;

use anyhow::{Context, Result};
use cartwise_core::stats::{get_monthly_spending, get_top_items, TopItemSort};
use cartwise_core::{export_items_csv, export_monthly_csv, export_top_items_csv};

use super::core::Session;

pub fn cmd_export(session: &Session, kind: &str, output: Option<&Path>) -> Result<()> {
    let receipts = session.receipts();

    let csv = match kind {
        "items" => export_items_csv(&receipts)?,
        "monthly" => export_monthly_csv(&get_monthly_spending(&receipts))?,
        "top-items" => export_top_items_csv(&get_top_items(
            &receipts,
            session.config.display.top_items,
            TopItemSort::Spending,
        ))?,
        other => anyhow::bail!(
            "Unknown export kind: {}. Available: items, monthly, top-items",
            other
        ),
    };

    match output {
        Some(path) => {
            std::fs::write(path, &csv)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "✅ Exported {} rows to {}",
                csv.lines().count().saturating_sub(1),
                path.display()
            );
        }
        None => print!("{}", csv),
    }

    Ok(())
}

//! Validation-only command

use std::path::{Path, PathBuf};

use anyhow::Result;
use cartwise_core::{ingest_files, FileStatus};

use super::core::load_config;

pub async fn cmd_check(config_path: Option<&Path>, files: &[PathBuf]) -> Result<()> {
    let config = load_config(config_path)?;

    println!("🔍 Checking {} file(s)...", files.len());

    let report = match ingest_files(files, &config.limits).await {
        Ok(report) => report,
        Err(e) => {
            println!("❌ {}", e);
            return Err(e.into());
        }
    };

    println!();
    println!(
        "   {:40} │ {:>12} │ {:>6} │ {:>7}",
        "File", "Status", "Valid", "Invalid"
    );
    println!("   ─────────────────────────────────────────┼──────────────┼────────┼────────");
    for file in &report.files {
        let name = Path::new(&file.filename)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.filename.clone());
        println!(
            "   {:40} │ {:>12} │ {:>6} │ {:>7}",
            super::truncate(&name, 40),
            file.status.as_str(),
            file.valid_count,
            file.invalid_count
        );
    }

    println!();
    for line in report.summary_lines(config.display.max_issues_shown) {
        println!("   {}", line);
    }

    let failed = report
        .files
        .iter()
        .filter(|f| f.status != FileStatus::Loaded)
        .count();
    println!();
    if failed == 0 && report.errors.is_empty() {
        println!("✅ All files valid");
    } else {
        println!(
            "⚠️  {} file(s) skipped, {} error(s); valid receipts will still be analyzed",
            failed,
            report.errors.len()
        );
    }

    Ok(())
}

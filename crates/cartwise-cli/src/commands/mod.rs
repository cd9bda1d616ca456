//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `check` - File validation without analysis
//! - `core` - Shared utilities (config, ingestion, filter flags)
//! - `export` - CSV export
//! - `items` - Top items, price trends, single-item history
//! - `reports` - Summary, warehouse, monthly and tax reports
//! - `rewards` - Executive reward simulation

pub mod check;
pub mod core;
pub mod export;
pub mod items;
pub mod reports;
pub mod rewards;

// Re-export command functions for main.rs
pub use check::*;
pub use core::*;
pub use export::*;
pub use items::*;
pub use reports::*;
pub use rewards::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

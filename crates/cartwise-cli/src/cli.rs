//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Cartwise - Understand your warehouse club spending
#[derive(Parser)]
#[command(name = "cartwise")]
#[command(about = "Local analytics for warehouse club receipt exports", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to ~/.config/cartwise/config.toml, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Receipt filter flags shared by every data command
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Start date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub from: Option<String>,

    /// End date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub to: Option<String>,

    /// Date preset: all, ytd, last12
    #[arg(long)]
    pub preset: Option<String>,

    /// Warehouse number, or "online"
    #[arg(long)]
    pub warehouse: Option<String>,

    /// Channel: warehouse, online, gas
    #[arg(long)]
    pub channel: Option<String>,

    /// Membership number
    #[arg(long)]
    pub membership: Option<String>,

    /// Only receipts with an item matching this text
    #[arg(long)]
    pub search: Option<String>,

    /// Transaction type (e.g. Sales, Refund)
    #[arg(long = "type")]
    pub transaction_type: Option<String>,
}

/// Input files plus filter flags
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Receipt export files (JSON arrays)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate export files and report problems without analyzing
    Check {
        /// Receipt export files (JSON arrays)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Headline totals, averages, warehouses and rewards
    Summary {
        #[command(flatten)]
        input: InputArgs,

        /// Print the full analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// Spending per warehouse
    Warehouses {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Spending per month
    Monthly {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Simulate executive membership rewards per cycle year
    Rewards {
        #[command(flatten)]
        input: InputArgs,

        /// Cycle start month (1-12)
        #[arg(long)]
        cycle_month: Option<u32>,

        /// Cycle start day (1-31)
        #[arg(long)]
        cycle_day: Option<u32>,

        /// Extra department code to exclude (repeatable)
        #[arg(long = "exclude-dept")]
        exclude_dept: Vec<u32>,
    },

    /// Top items
    Items {
        #[command(flatten)]
        input: InputArgs,

        /// Sort by: spending, quantity, frequency
        #[arg(long, default_value = "spending")]
        sort: String,

        /// Number of items to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Items whose price changed between purchases
    Prices {
        #[command(flatten)]
        input: InputArgs,

        /// Show price drops instead of increases
        #[arg(long)]
        decreases: bool,

        /// Number of items to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Tax apportioned to departments
    Taxes {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Purchase history of a single item
    Item {
        /// Item number (given before the input files)
        number: String,

        #[command(flatten)]
        input: InputArgs,
    },

    /// Export data as CSV
    Export {
        #[command(flatten)]
        input: InputArgs,

        /// What to export: items, monthly, top-items
        #[arg(short, long, default_value = "items")]
        kind: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

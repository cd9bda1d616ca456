//! Cartwise CLI - Warehouse club receipt analytics
//!
//! Usage:
//!   cartwise check exports/*.json          Validate export files
//!   cartwise summary exports/*.json        Headline statistics
//!   cartwise rewards --cycle-month 3 ...   Simulate reward cycles
//!   cartwise export --kind items ...       Export CSV

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Check { files } => commands::cmd_check(config_path, &files).await,
        Commands::Summary { input, json } => {
            let session = commands::load_session(config_path, &input).await?;
            commands::cmd_summary(&session, json)
        }
        Commands::Warehouses { input } => {
            let session = commands::load_session(config_path, &input).await?;
            commands::cmd_warehouses(&session)
        }
        Commands::Monthly { input } => {
            let session = commands::load_session(config_path, &input).await?;
            commands::cmd_monthly(&session)
        }
        Commands::Rewards {
            input,
            cycle_month,
            cycle_day,
            exclude_dept,
        } => {
            let session = commands::load_session(config_path, &input).await?;
            let overrides = commands::RewardOverrides {
                cycle_month,
                cycle_day,
                exclude_departments: exclude_dept,
            };
            commands::cmd_rewards(&session, &overrides)
        }
        Commands::Items { input, sort, limit } => {
            let session = commands::load_session(config_path, &input).await?;
            commands::cmd_items(&session, &sort, limit)
        }
        Commands::Prices {
            input,
            decreases,
            limit,
        } => {
            let session = commands::load_session(config_path, &input).await?;
            commands::cmd_prices(&session, decreases, limit)
        }
        Commands::Taxes { input } => {
            let session = commands::load_session(config_path, &input).await?;
            commands::cmd_taxes(&session)
        }
        Commands::Item { number, input } => {
            let session = commands::load_session(config_path, &input).await?;
            commands::cmd_item(&session, &number)
        }
        Commands::Export {
            input,
            kind,
            output,
        } => {
            let session = commands::load_session(config_path, &input).await?;
            commands::cmd_export(&session, &kind, output.as_deref())
        }
    }
}

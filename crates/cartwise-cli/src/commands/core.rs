//! Shared command plumbing
//!
//! This module contains:
//! - `Session` - Loaded config, receipt store and active filter
//! - `load_session` - Config resolution plus file ingestion
//! - `build_filter` - Translate filter flags into a `ReceiptFilter`

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use cartwise_core::stats::AnalysisOptions;
use cartwise_core::{
    ingest_files, ChannelFilter, Config, Preset, Receipt, ReceiptFilter, ReceiptStore,
    WarehouseFilter,
};
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::cli::{FilterArgs, InputArgs};

/// Everything a data command needs
pub struct Session {
    pub config: Config,
    pub store: ReceiptStore,
    pub filter: ReceiptFilter,
}

impl Session {
    pub fn new(config: Config, receipts: Vec<Receipt>, filter: ReceiptFilter) -> Self {
        let mut store = ReceiptStore::new();
        store.add_receipts(receipts);
        Self {
            config,
            store,
            filter,
        }
    }

    /// Receipts passing the active filter
    pub fn receipts(&self) -> Vec<Receipt> {
        self.store.filtered(&self.filter)
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            rewards: self.config.rewards.clone(),
        }
    }
}

pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    Config::load(config_path).context("Failed to load config")
}

fn parse_date(value: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid {} date '{}' (use YYYY-MM-DD)", flag, value))
}

/// Build a filter from flags. Explicit dates override a preset.
pub fn build_filter(args: &FilterArgs) -> Result<ReceiptFilter> {
    let mut filter = ReceiptFilter::new();

    if let Some(preset) = &args.preset {
        let preset: Preset = preset.parse().map_err(|e: String| anyhow!(e))?;
        filter.set_preset(preset);
    }

    if args.from.is_some() || args.to.is_some() {
        let start = args.from.as_deref().map(|d| parse_date(d, "--from")).transpose()?;
        let end = args.to.as_deref().map(|d| parse_date(d, "--to")).transpose()?;
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                anyhow::bail!("--from {} is after --to {}", start, end);
            }
        }
        filter.set_date_range(start, end);
    }

    if let Some(warehouse) = &args.warehouse {
        let warehouse: WarehouseFilter = warehouse.parse().map_err(|e: String| anyhow!(e))?;
        filter.set_warehouse(Some(warehouse));
    }
    if let Some(channel) = &args.channel {
        let channel: ChannelFilter = channel.parse().map_err(|e: String| anyhow!(e))?;
        filter.set_channel(Some(channel));
    }
    filter.set_membership(args.membership.clone());
    filter.set_search(args.search.clone());
    filter.set_transaction_type(args.transaction_type.clone());

    debug!("Filter: {:?}", filter);
    Ok(filter)
}

/// Resolve config, ingest the input files and apply filter flags
pub async fn load_session(config_path: Option<&Path>, input: &InputArgs) -> Result<Session> {
    let config = load_config(config_path)?;
    let filter = build_filter(&input.filter)?;

    let report = ingest_files(&input.files, &config.limits)
        .await
        .context("Failed to load receipts")?;

    if !report.errors.is_empty() {
        warn!(
            "{} problems while loading; run `cartwise check` for details",
            report.errors.len()
        );
    }

    Ok(Session::new(config, report.receipts, filter))
}

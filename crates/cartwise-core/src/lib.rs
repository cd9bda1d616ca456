//! Cartwise Core Library
//!
//! Local analytics over warehouse-club receipt exports:
//! - Schema validation of raw vendor JSON
//! - Normalization of warehouse, online and gas station receipts
//! - Deduplication across overlapping exports
//! - In-memory receipt store with item and warehouse indexes
//! - Composable receipt filters with date presets
//! - Spending statistics, price trends and reward cycle simulation
//! - CSV export of items and reports

pub mod config;
pub mod departments;
pub mod error;
pub mod export;
pub mod filter;
pub mod ingest;
pub mod merge;
pub mod models;
pub mod money;
pub mod normalize;
pub mod stats;
pub mod store;
pub mod validate;

pub use config::{Config, DisplayConfig};
pub use error::{Error, Result};
pub use export::{export_items_csv, export_monthly_csv, export_top_items_csv};
pub use filter::{ChannelFilter, Preset, ReceiptFilter, WarehouseFilter};
pub use ingest::{
    check_file_sizes, ingest_documents, ingest_files, FileCandidate, FileOutcome, FileRejection,
    FileStatus, IngestReport, Limits,
};
pub use merge::merge_receipts;
pub use models::{Channel, FuelDetails, Item, Quantity, Receipt};
pub use normalize::{normalize_item, normalize_receipt};
pub use stats::{calculate_all, Analysis, AnalysisOptions, RewardsConfig, TopItemSort};
pub use store::{ItemOccurrence, ReceiptStore, WarehouseRef};
pub use validate::{validate_json_structure, validate_receipt, StructureReport, ValidationIssue};

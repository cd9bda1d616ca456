//! Schema checks for raw receipt exports
//!
//! Validation runs before normalization and separates hard errors (the
//! receipt is rejected) from warnings (the receipt is kept and the problem is
//! recorded for diagnostics).

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::KNOWN_TRANSACTION_TYPES;
use crate::money::{within, CENT_TOLERANCE};
use crate::normalize::{coerce_number, parse_datetime, DATE_FIELDS};

/// One validation finding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    /// Position of the receipt in its file (None for file-level issues)
    pub receipt_index: Option<usize>,
    pub item_index: Option<usize>,
    pub field: Option<String>,
    pub message: String,
}

impl ValidationIssue {
    fn file(message: impl Into<String>) -> Self {
        Self {
            receipt_index: None,
            item_index: None,
            field: None,
            message: message.into(),
        }
    }

    fn receipt(index: usize, field: &str, message: impl Into<String>) -> Self {
        Self {
            receipt_index: Some(index),
            item_index: None,
            field: Some(field.to_string()),
            message: message.into(),
        }
    }

    fn item(index: usize, item: usize, field: &str, message: impl Into<String>) -> Self {
        Self {
            receipt_index: Some(index),
            item_index: Some(item),
            field: Some(field.to_string()),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.receipt_index, self.item_index) {
            (Some(r), Some(i)) => write!(f, "Receipt {}, item {}: {}", r + 1, i + 1, self.message),
            (Some(r), None) => write!(f, "Receipt {}: {}", r + 1, self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

/// Outcome of validating a single raw receipt
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReceiptValidation {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// Outcome of validating a whole file's JSON payload
#[derive(Debug, Clone, Default, Serialize)]
pub struct StructureReport {
    pub filename: String,
    pub valid: bool,
    /// Raw receipts that passed validation, in file order
    #[serde(skip)]
    pub receipts: Vec<(usize, Value)>,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => {
            let cleaned = s.trim().replace(['$', ','], "");
            !cleaned.is_empty() && cleaned.parse::<f64>().is_ok()
        }
        _ => false,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn has_text(item: &Value, keys: &[&str]) -> bool {
    keys.iter().any(|k| {
        item.get(*k)
            .and_then(Value::as_str)
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    })
}

/// Validate one raw receipt
pub fn validate_receipt(raw: &Value, index: usize) -> ReceiptValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let Some(obj) = raw.as_object() else {
        errors.push(ValidationIssue {
            receipt_index: Some(index),
            item_index: None,
            field: None,
            message: format!("expected an object, found {}", type_name(raw)),
        });
        return ReceiptValidation {
            valid: false,
            errors,
            warnings,
        };
    };

    // transactionType
    match obj.get("transactionType") {
        None | Some(Value::Null) => errors.push(ValidationIssue::receipt(
            index,
            "transactionType",
            "missing required field 'transactionType'",
        )),
        Some(Value::String(t)) => {
            if !KNOWN_TRANSACTION_TYPES
                .iter()
                .any(|k| k.eq_ignore_ascii_case(t.trim()))
            {
                warnings.push(ValidationIssue::receipt(
                    index,
                    "transactionType",
                    format!("unexpected transaction type '{}'", t),
                ));
            }
        }
        Some(other) => errors.push(ValidationIssue::receipt(
            index,
            "transactionType",
            format!("'transactionType' must be a string, found {}", type_name(other)),
        )),
    }

    // total
    match obj.get("total") {
        None | Some(Value::Null) => errors.push(ValidationIssue::receipt(
            index,
            "total",
            "missing required field 'total'",
        )),
        Some(v) if !is_numeric(v) => errors.push(ValidationIssue::receipt(
            index,
            "total",
            format!("'total' must be a number, found {}", type_name(v)),
        )),
        Some(_) => {}
    }

    // warehouseNumber
    match obj.get("warehouseNumber") {
        None | Some(Value::Null) => errors.push(ValidationIssue::receipt(
            index,
            "warehouseNumber",
            "missing required field 'warehouseNumber'",
        )),
        Some(Value::Number(_)) | Some(Value::String(_)) => {}
        Some(other) => errors.push(ValidationIssue::receipt(
            index,
            "warehouseNumber",
            format!(
                "'warehouseNumber' must be a number or string, found {}",
                type_name(other)
            ),
        )),
    }

    // At least one date field
    let dates: Vec<&str> = DATE_FIELDS
        .iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .collect();
    if dates.is_empty() {
        errors.push(ValidationIssue::receipt(
            index,
            "transactionDateTime",
            format!("missing a date field (one of {})", DATE_FIELDS.join(", ")),
        ));
    } else if !dates.iter().any(|d| parse_datetime(d).is_some()) {
        warnings.push(ValidationIssue::receipt(
            index,
            "transactionDateTime",
            format!("unparseable date '{}'", dates[0]),
        ));
    }

    // itemArray
    match obj.get("itemArray") {
        None | Some(Value::Null) => errors.push(ValidationIssue::receipt(
            index,
            "itemArray",
            "missing required field 'itemArray'",
        )),
        Some(Value::Array(items)) => {
            if items.is_empty() {
                warnings.push(ValidationIssue::receipt(
                    index,
                    "itemArray",
                    "receipt has no items",
                ));
            }
            for (item_index, item) in items.iter().enumerate() {
                validate_item(item, index, item_index, &mut errors, &mut warnings);
            }
        }
        Some(other) => errors.push(ValidationIssue::receipt(
            index,
            "itemArray",
            format!("'itemArray' must be an array, found {}", type_name(other)),
        )),
    }

    // total ≈ subTotal + taxes − orderDiscount
    if let (Some(total), Some(sub_total), Some(taxes)) =
        (obj.get("total"), obj.get("subTotal"), obj.get("taxes"))
    {
        if is_numeric(total) && is_numeric(sub_total) && is_numeric(taxes) {
            let total = coerce_number(Some(total));
            let discount = coerce_number(obj.get("orderDiscount")).abs();
            let expected =
                coerce_number(Some(sub_total)) + coerce_number(Some(taxes)) - discount;
            if !within(total, expected, CENT_TOLERANCE) {
                warnings.push(ValidationIssue::receipt(
                    index,
                    "total",
                    format!(
                        "total {:.2} does not match subtotal + taxes - discount ({:.2})",
                        total, expected
                    ),
                ));
            }
        }
    }

    ReceiptValidation {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

fn validate_item(
    item: &Value,
    index: usize,
    item_index: usize,
    errors: &mut Vec<ValidationIssue>,
    warnings: &mut Vec<ValidationIssue>,
) {
    let Some(obj) = item.as_object() else {
        errors.push(ValidationIssue::item(
            index,
            item_index,
            "itemArray",
            format!("item must be an object, found {}", type_name(item)),
        ));
        return;
    };

    match obj.get("itemNumber") {
        None | Some(Value::Null) => errors.push(ValidationIssue::item(
            index,
            item_index,
            "itemNumber",
            "missing required field 'itemNumber'",
        )),
        Some(Value::String(_)) | Some(Value::Number(_)) => {}
        Some(other) => errors.push(ValidationIssue::item(
            index,
            item_index,
            "itemNumber",
            format!("'itemNumber' must be a string or number, found {}", type_name(other)),
        )),
    }

    match obj.get("amount") {
        None | Some(Value::Null) => errors.push(ValidationIssue::item(
            index,
            item_index,
            "amount",
            "missing required field 'amount'",
        )),
        Some(v) if !is_numeric(v) => errors.push(ValidationIssue::item(
            index,
            item_index,
            "amount",
            format!("'amount' must be a number, found {}", type_name(v)),
        )),
        Some(_) => {}
    }

    // Online exports use unit labels like "EA"
    match obj.get("unit") {
        None | Some(Value::Null) => errors.push(ValidationIssue::item(
            index,
            item_index,
            "unit",
            "missing required field 'unit'",
        )),
        Some(Value::Number(_)) | Some(Value::String(_)) => {}
        Some(other) => errors.push(ValidationIssue::item(
            index,
            item_index,
            "unit",
            format!(
                "'unit' must be a number or unit label, found {}",
                type_name(other)
            ),
        )),
    }

    if !has_text(
        item,
        &[
            "itemDescription01",
            "itemDescription",
            "description",
            "itemName",
            "name",
            "productName",
        ],
    ) {
        warnings.push(ValidationIssue::item(
            index,
            item_index,
            "itemDescription01",
            "item has no description",
        ));
    }
}

/// Validate a whole file's parsed JSON payload
pub fn validate_json_structure(data: &Value, filename: &str) -> StructureReport {
    let mut report = StructureReport {
        filename: filename.to_string(),
        ..Default::default()
    };

    let receipts = match data {
        Value::Array(receipts) => receipts,
        other => {
            report.errors.push(ValidationIssue::file(format!(
                "{}: expected a JSON array of receipts, found {}",
                filename,
                type_name(other)
            )));
            return report;
        }
    };

    if receipts.is_empty() {
        report.errors.push(ValidationIssue::file(format!(
            "{}: file contains no receipts",
            filename
        )));
        return report;
    }

    for (index, raw) in receipts.iter().enumerate() {
        let result = validate_receipt(raw, index);
        report.warnings.extend(result.warnings);
        if result.valid {
            report.valid_count += 1;
            report.receipts.push((index, raw.clone()));
        } else {
            report.invalid_count += 1;
            report.errors.extend(result.errors);
        }
    }

    report.valid = report.valid_count > 0;

    if report.valid {
        debug!(
            "{}: {} valid receipts, {} invalid",
            filename, report.valid_count, report.invalid_count
        );
    } else {
        warn!("{}: no valid receipts in {} records", filename, receipts.len());
    }

    report
}

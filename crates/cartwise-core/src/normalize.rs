//! Receipt normalization
//!
//! Converts one raw receipt from either vendor schema (warehouse/gas exports
//! or online order exports) into the canonical [`Receipt`] model. The schema
//! variant is sniffed from field presence; nothing here fails. Missing
//! numbers become 0, malformed dates become `None`, and rejecting bad input
//! is left to [`crate::validate`].

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::trace;

use crate::departments::department_label;
use crate::models::{Channel, FuelDetails, Item, Quantity, Receipt};
use crate::money::round_cents;

/// Date fields in order of preference
pub const DATE_FIELDS: &[&str] = &["transactionDateTime", "transactionDate", "orderPlacedDate"];

const NAME_FIELDS: &[&str] = &["itemName", "name", "productName"];
const DESCRIPTION_FIELDS: &[&str] = &["itemDescription01", "itemDescription", "description"];

fn item_reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/(\d+)").expect("valid regex"))
}

/// Referenced item number when a name looks like "/1234567"
pub fn item_reference(name: &str) -> Option<String> {
    item_reference_re()
        .captures(name.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Coerce a JSON value to a number the way loosely typed exports expect:
/// numbers pass through, numeric strings parse, anything else is 0.
pub fn coerce_number(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let cleaned = s.trim().replace(['$', ','], "");
            if cleaned.is_empty() {
                None
            } else {
                cleaned.parse::<f64>().ok()
            }
        }
        Some(Value::Bool(true)) => Some(1.0),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Coerce a JSON value to a non-empty trimmed string
pub fn coerce_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        Some(Value::Number(n)) => Some(match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        }),
        _ => None,
    }
}

fn first_string(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| coerce_string(raw.get(*k)))
}

fn lower(raw: &Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_lowercase())
}

/// Resolve the unit column into a [`Quantity`]
pub fn parse_quantity(value: Option<&Value>) -> Quantity {
    match value {
        Some(Value::Number(n)) => Quantity::Numeric(n.as_f64().unwrap_or(0.0)),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Quantity::Numeric(0.0)
            } else {
                match s.parse::<f64>() {
                    Ok(v) if v.is_finite() => Quantity::Numeric(v),
                    _ => Quantity::Labeled(s.to_string()),
                }
            }
        }
        _ => Quantity::Numeric(0.0),
    }
}

/// Parse a timestamp or bare date in any of the formats the exports use
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    let datetime_formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    let date_formats = ["%Y-%m-%d", "%m/%d/%Y"];
    for fmt in date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// First parseable date among [`DATE_FIELDS`]
pub fn receipt_date(raw: &Value) -> Option<NaiveDateTime> {
    DATE_FIELDS
        .iter()
        .filter_map(|k| raw.get(*k).and_then(Value::as_str))
        .find_map(parse_datetime)
}

/// Decide which purchase path a raw receipt came from.
///
/// The exports carry several overlapping markers and none is authoritative,
/// so every marker is consulted here, once, and the answer is stored on the
/// normalized receipt.
pub fn classify_channel(raw: &Value) -> Channel {
    let channel = lower(raw, "channel");
    let document_type = lower(raw, "documentType");
    let warehouse_name = lower(raw, "warehouseName");
    let receipt_type = lower(raw, "receiptType");

    let online = channel.as_deref() == Some("online")
        || matches!(document_type.as_deref(), Some("online") | Some("onlinereceipts"))
        || warehouse_name.as_deref() == Some("online")
        || receipt_type.as_deref() == Some("online");
    if online {
        return Channel::Online;
    }

    let fuel_items = raw
        .get("itemArray")
        .and_then(Value::as_array)
        .map(|items| {
            items.iter().any(|item| {
                first_string(item, &["fuelGradeCode", "fuelGradeDescription"]).is_some()
            })
        })
        .unwrap_or(false);

    let gas = receipt_type.as_deref() == Some("gas station")
        || document_type.as_deref() == Some("fuelreceipts")
        || matches!(
            channel.as_deref(),
            Some("gas") | Some("gas_station") | Some("gas station")
        )
        || fuel_items;
    if gas {
        return Channel::GasStation;
    }

    Channel::Warehouse
}

fn normalize_transaction_type(value: Option<&Value>) -> String {
    match coerce_string(value) {
        Some(t) if t.eq_ignore_ascii_case("delivered") => "Sales".to_string(),
        Some(t) => t,
        None => "Sales".to_string(),
    }
}

fn receipt_id(
    warehouse_number: &str,
    date: Option<NaiveDateTime>,
    transaction_number: Option<&str>,
    raw: &Value,
) -> String {
    match (date, transaction_number) {
        (Some(date), Some(number)) if !warehouse_number.is_empty() => {
            format!("{}-{}-{}", warehouse_number, date.format("%Y%m%d"), number)
        }
        _ => {
            // serde_json maps are ordered, so the serialization is stable
            let mut hasher = Sha256::new();
            hasher.update(raw.to_string().as_bytes());
            let digest = hex::encode(hasher.finalize());
            format!("rcpt-{}", &digest[..16])
        }
    }
}

/// Normalize one raw item line
pub fn normalize_item(raw: &Value) -> Item {
    let item_number = coerce_string(raw.get("itemNumber")).unwrap_or_default();
    let amount = coerce_number(raw.get("amount"));
    let unit = parse_quantity(raw.get("unit"));
    let quantity = unit.value();

    let actual_name = first_string(raw, NAME_FIELDS);
    let description = first_string(raw, DESCRIPTION_FIELDS);

    let reference = actual_name
        .as_deref()
        .and_then(item_reference)
        .or_else(|| description.as_deref().and_then(item_reference));
    let has_reference = reference.is_some();

    let is_return = amount < 0.0 && quantity < 0.0 && !has_reference;
    let is_discount = amount < 0.0 && (has_reference || (!is_return && quantity >= 0.0));
    let discount_applies_to = if is_discount { reference.clone() } else { None };

    let explicit_unit_price = coerce_number(raw.get("itemUnitPriceAmount"));
    let unit_price = round_cents(if quantity != 0.0 {
        amount / quantity
    } else if explicit_unit_price != 0.0 {
        explicit_unit_price
    } else {
        amount
    });

    let non_reference = |name: &Option<String>| {
        name.as_ref()
            .filter(|n| item_reference(n).is_none())
            .cloned()
    };
    let normalized_name = non_reference(&actual_name)
        .or_else(|| non_reference(&description))
        .or_else(|| reference.as_ref().map(|r| format!("Discount on Item {}", r)))
        .unwrap_or_else(|| format!("Item {}", item_number));

    let department_number = {
        let n = coerce_number(raw.get("itemDepartmentNumber"));
        if n > 0.0 && n.fract() == 0.0 {
            Some(n as u32)
        } else {
            None
        }
    };

    let fuel_grade = first_string(raw, &["fuelGradeDescription", "fuelGradeCode"]);
    let fuel_quantity = coerce_number(raw.get("fuelUnitQuantity"));
    let fuel = if fuel_grade.is_some() || fuel_quantity != 0.0 {
        Some(FuelDetails {
            grade: fuel_grade,
            quantity: fuel_quantity,
            unit_of_measure: first_string(raw, &["fuelUomDescription", "fuelUomCode"]),
        })
    } else {
        None
    };

    Item {
        item_number,
        amount,
        unit,
        quantity,
        unit_price,
        description: description.or(actual_name),
        normalized_name,
        is_discount,
        is_return,
        discount_applies_to,
        department_number,
        department_name: department_number.map(department_label),
        fuel,
    }
}

/// Normalize one raw receipt.
///
/// `index` is the receipt's position in its source file and only feeds
/// diagnostics; the id depends on receipt content alone so that the same
/// receipt exported twice normalizes identically.
pub fn normalize_receipt(raw: &Value, index: usize, source_file: &str) -> Receipt {
    let channel = classify_channel(raw);
    let items: Vec<Item> = raw
        .get("itemArray")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(normalize_item).collect())
        .unwrap_or_default();

    let transaction_date_time = receipt_date(raw);
    let warehouse_number = coerce_string(raw.get("warehouseNumber")).unwrap_or_default();
    let transaction_number = first_string(raw, &["transactionNumber", "orderNumber"]);
    let id = receipt_id(
        &warehouse_number,
        transaction_date_time,
        transaction_number.as_deref(),
        raw,
    );

    let warehouse_name = if channel == Channel::Online {
        "Online".to_string()
    } else {
        first_string(raw, &["warehouseName", "warehouseShortName"]).unwrap_or_else(|| {
            if warehouse_number.is_empty() {
                "Unknown Warehouse".to_string()
            } else {
                format!("Warehouse {}", warehouse_number)
            }
        })
    };

    let order_discount = coerce_number(raw.get("orderDiscount"));
    let instant_savings = if order_discount != 0.0 {
        round_cents(order_discount.abs())
    } else {
        round_cents(
            items
                .iter()
                .filter(|i| i.is_discount)
                .map(|i| i.amount.abs())
                .sum(),
        )
    };

    let is_travel = ["receiptType", "documentType", "warehouseName"]
        .iter()
        .filter_map(|k| lower(raw, k))
        .any(|v| v.contains("travel"));

    trace!(index, source_file, id = %id, channel = %channel, "Normalized receipt");

    Receipt {
        id,
        transaction_barcode: coerce_string(raw.get("transactionBarcode")),
        transaction_date_time,
        transaction_type: normalize_transaction_type(raw.get("transactionType")),
        warehouse_number,
        warehouse_name,
        warehouse_city: first_string(raw, &["warehouseCity", "city"]),
        warehouse_state: first_string(raw, &["warehouseState", "state"]),
        membership_number: coerce_string(raw.get("membershipNumber")),
        total: coerce_number(raw.get("total")),
        sub_total: coerce_number(raw.get("subTotal")),
        taxes: coerce_number(raw.get("taxes")),
        instant_savings,
        items,
        channel,
        is_travel,
        source_file: source_file.to_string(),
        original: raw.clone(),
    }
}

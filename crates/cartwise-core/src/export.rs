//! CSV export of item lines and aggregate reports

use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::Receipt;
use crate::stats::{ItemSummary, MonthlySpending};

/// One exported item line with its receipt context
#[derive(Debug, Serialize)]
struct ItemRow<'a> {
    date: String,
    receipt_id: &'a str,
    warehouse: &'a str,
    channel: &'a str,
    transaction_type: &'a str,
    item_number: &'a str,
    name: &'a str,
    department: &'a str,
    quantity: f64,
    amount: f64,
    unit_price: f64,
    discount: bool,
    return_line: bool,
}

#[derive(Debug, Serialize)]
struct TopItemRow<'a> {
    item_number: &'a str,
    name: &'a str,
    department: &'a str,
    total_quantity: f64,
    total_spent: f64,
    purchase_count: usize,
    first_price: f64,
    last_price: f64,
    price_trend: f64,
}

fn write_rows<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| Error::InvalidData(format!("CSV is not UTF-8: {}", e)))
}

/// Export every item line, one row per line
pub fn export_items_csv(receipts: &[Receipt]) -> Result<String> {
    let rows = receipts.iter().flat_map(|receipt| {
        let date = receipt
            .transaction_date_time
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        receipt.items.iter().map(move |item| ItemRow {
            date: date.clone(),
            receipt_id: &receipt.id,
            warehouse: &receipt.warehouse_name,
            channel: receipt.channel.as_str(),
            transaction_type: &receipt.transaction_type,
            item_number: &item.item_number,
            name: &item.normalized_name,
            department: item.department_name.as_deref().unwrap_or(""),
            quantity: item.quantity,
            amount: item.amount,
            unit_price: item.unit_price,
            discount: item.is_discount,
            return_line: item.is_return,
        })
    });
    write_rows(rows)
}

/// Export the monthly spending series
pub fn export_monthly_csv(monthly: &[MonthlySpending]) -> Result<String> {
    write_rows(monthly)
}

/// Export an item ranking
pub fn export_top_items_csv(items: &[ItemSummary]) -> Result<String> {
    write_rows(items.iter().map(|item| TopItemRow {
        item_number: &item.item_number,
        name: &item.name,
        department: item.department_name.as_deref().unwrap_or(""),
        total_quantity: item.total_quantity,
        total_spent: item.total_spent,
        purchase_count: item.purchase_count,
        first_price: item.first_price,
        last_price: item.last_price,
        price_trend: item.price_trend,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_receipt;
    use crate::stats::{get_monthly_spending, get_top_items, TopItemSort};
    use serde_json::json;

    fn receipts() -> Vec<Receipt> {
        vec![normalize_receipt(
            &json!({"warehouseNumber": 1, "warehouseName": "SEATTLE", "transactionNumber": 9,
                    "transactionDateTime": "2024-03-15T14:22:00", "transactionType": "Sales", "total": 21.37,
                    "itemArray": [
                        {"itemNumber": "111", "itemDescription01": "KS WATER, 40 PK", "amount": 19.99, "unit": 1},
                        {"itemNumber": "999", "itemDescription01": "/111", "amount": -2.0, "unit": 0}
                    ]}),
            0,
            "t.json",
        )]
    }

    #[test]
    fn test_export_items_csv() {
        let csv = export_items_csv(&receipts()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("date,receipt_id,warehouse,channel"));
        // Embedded comma is quoted
        assert!(lines[1].contains("\"KS WATER, 40 PK\""));
        assert!(lines[2].contains("Discount on Item 111"));
        assert!(lines[2].ends_with("true,false"));
    }

    #[test]
    fn test_export_monthly_csv() {
        let monthly = get_monthly_spending(&receipts());
        let csv = export_monthly_csv(&monthly).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "month,receipt_count,trip_count,total,gross,refunds,taxes,savings");
        assert!(lines[1].starts_with("2024-03,1,1,21.37"));
    }

    #[test]
    fn test_export_top_items_csv() {
        let items = get_top_items(&receipts(), 10, TopItemSort::Spending);
        let csv = export_top_items_csv(&items).unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.lines().nth(1).unwrap().starts_with("111,"));
    }

    #[test]
    fn test_export_empty() {
        assert_eq!(export_items_csv(&[]).unwrap(), "");
    }
}

//! Tax apportioned to departments
//!
//! Exports carry one tax figure per receipt. Each receipt's tax is spread
//! over its item lines in proportion to their share of the absolute item
//! subtotal, which approximates per-department tax without per-item data.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::departments::department_label;
use crate::models::Receipt;
use crate::money::round_cents;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentTax {
    /// `None` for lines without a department
    pub department_number: Option<u32>,
    pub department_name: String,
    pub allocated_tax: f64,
    /// Net item spend in the department
    pub item_spend: f64,
    pub item_count: usize,
}

#[derive(Default)]
struct Acc {
    tax: f64,
    spend: f64,
    count: usize,
}

/// Allocate receipt taxes across departments, largest share first
pub fn tax_by_department(receipts: &[Receipt]) -> Vec<DepartmentTax> {
    let mut departments: BTreeMap<Option<u32>, Acc> = BTreeMap::new();

    for receipt in receipts {
        let lines: Vec<_> = receipt
            .items
            .iter()
            .filter(|i| !i.is_discount && i.amount != 0.0)
            .collect();
        let subtotal: f64 = lines.iter().map(|i| i.amount.abs()).sum();
        if subtotal == 0.0 {
            continue;
        }
        let tax = receipt.signed(receipt.taxes);

        for item in lines {
            let acc = departments.entry(item.department_number).or_default();
            acc.tax += tax * item.amount.abs() / subtotal;
            acc.spend += receipt.signed(item.amount);
            acc.count += 1;
        }
    }

    let mut result: Vec<DepartmentTax> = departments
        .into_iter()
        .map(|(number, acc)| DepartmentTax {
            department_number: number,
            department_name: number
                .map(department_label)
                .unwrap_or_else(|| "Unassigned".to_string()),
            allocated_tax: round_cents(acc.tax),
            item_spend: round_cents(acc.spend),
            item_count: acc.count,
        })
        .collect();

    result.sort_by(|a, b| b.allocated_tax.total_cmp(&a.allocated_tax));
    result
}

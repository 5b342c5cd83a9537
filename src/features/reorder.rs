//! Column reorderer.
//!
//! Canonical order: text columns sorted by name, then every other column
//! sorted by name. The primary temporal column (`SaleDate`, or `SaleYear` once
//! the date has been split) is then moved to the front and the target
//! (`Price`) to the back. The order depends only on column names and kinds.

use crate::table::{Column, Table};

/// Columns that lead the canonical order, first match wins.
pub const TEMPORAL_COLUMNS: [&str; 2] = ["SaleDate", "SaleYear"];

pub const TARGET_COLUMN: &str = "Price";

/// Canonical column order of a table.
pub fn canonical_order(table: &Table) -> Vec<String> {
    let (text, other): (Vec<&Column>, Vec<&Column>) =
        table.columns().iter().partition(|c| c.kind().is_text());
    let mut text: Vec<&str> = text.into_iter().map(Column::name).collect();
    let mut other: Vec<&str> = other.into_iter().map(Column::name).collect();
    text.sort_unstable();
    other.sort_unstable();

    let mut order: Vec<&str> = text.into_iter().chain(other).collect();

    if let Some(&lead) = TEMPORAL_COLUMNS.iter().find(|c| order.contains(*c)) {
        order.retain(|c| *c != lead);
        order.insert(0, lead);
    }
    if let Some(pos) = order.iter().position(|c| *c == TARGET_COLUMN) {
        let target = order.remove(pos);
        order.push(target);
    }
    order.into_iter().map(str::to_string).collect()
}

/// Rearrange a table's columns into canonical order.
pub fn reorder_columns(table: Table) -> Table {
    let order = canonical_order(&table);
    table.with_column_order(&order)
}

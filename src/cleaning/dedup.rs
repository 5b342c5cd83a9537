//! Deduplicator: removes exact duplicate rows, keeping the first occurrence.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::debug;

use crate::table::{Table, Value};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum CellKey {
    Missing,
    Int(i64),
    Float(u64),
    Text(String),
    Date(NaiveDate),
}

impl From<Value> for CellKey {
    fn from(value: Value) -> Self {
        match value {
            Value::Missing => CellKey::Missing,
            Value::Int(v) => CellKey::Int(v),
            // -0.0 and 0.0 compare equal as cell values.
            Value::Float(v) if v == 0.0 => CellKey::Float(0.0_f64.to_bits()),
            Value::Float(v) => CellKey::Float(v.to_bits()),
            Value::Text(v) => CellKey::Text(v),
            Value::Date(v) => CellKey::Date(v),
        }
    }
}

/// Drop rows identical to an earlier row in every column.
pub fn drop_duplicates(table: Table) -> Table {
    let mut seen: HashSet<Vec<CellKey>> = HashSet::with_capacity(table.n_rows());
    let keep: Vec<bool> = (0..table.n_rows())
        .map(|row| {
            let key = table
                .columns()
                .iter()
                .map(|c| CellKey::from(c.data().get(row)))
                .collect();
            seen.insert(key)
        })
        .collect();

    let removed = keep.iter().filter(|k| !**k).count();
    if removed == 0 {
        return table;
    }
    debug!(removed, "dropped duplicate rows");
    table.filter_rows(&keep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    #[test]
    fn test_drop_duplicates_keeps_first() {
        let table = Table::from_columns(vec![
            Column::text("Suburb", vec![Some("Kew"), Some("Kew"), Some("Kew"), None]),
            Column::int("Rooms", vec![Some(2), Some(3), Some(2), None]),
            Column::float("Area", vec![Some(0.0), Some(1.0), Some(-0.0), None]),
        ])
        .unwrap();
        let out = drop_duplicates(table);
        assert_eq!(out.n_rows(), 3);
        assert_eq!(out.value(1, "Rooms"), Value::Int(3));
        assert_eq!(out.value(2, "Suburb"), Value::Missing);
    }

    #[test]
    fn test_drop_duplicates_without_duplicates_is_identity() {
        let table = Table::from_columns(vec![Column::int("A", vec![Some(1), Some(2)])]).unwrap();
        assert_eq!(drop_duplicates(table.clone()), table);
    }
}

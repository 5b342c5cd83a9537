//! Typed column reads for transformers.
//!
//! An absent column reads as all-missing. A column of the wrong type is an
//! error, except when every cell is missing: one-row tables assembled from
//! records cannot tell the type of a column that has no value.

use crate::error::{PipelineError, Result};
use crate::table::{ColumnData, Table};

pub(crate) fn numeric_values(table: &Table, name: &str) -> Result<Vec<Option<f64>>> {
    let Some(column) = table.column(name) else {
        return Ok(vec![None; table.n_rows()]);
    };
    match column.data() {
        ColumnData::Int(v) => Ok(v.iter().map(|x| x.map(|x| x as f64)).collect()),
        ColumnData::Float(v) => Ok(v.clone()),
        data if data.missing_count() == data.len() => Ok(vec![None; data.len()]),
        _ => Err(PipelineError::ColumnType {
            column: name.to_string(),
            expected: "numeric",
        }),
    }
}

pub(crate) fn text_values<'a>(table: &'a Table, name: &str) -> Result<Vec<Option<&'a str>>> {
    let Some(column) = table.column(name) else {
        return Ok(vec![None; table.n_rows()]);
    };
    match column.data() {
        ColumnData::Text(v) => Ok(v.iter().map(|x| x.as_deref()).collect()),
        data if data.missing_count() == data.len() => Ok(vec![None; data.len()]),
        _ => Err(PipelineError::ColumnType {
            column: name.to_string(),
            expected: "text",
        }),
    }
}

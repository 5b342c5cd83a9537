//! Null estimator.
//!
//! Fills missing cells column by column: numeric and date columns with the
//! median of their present values, text columns with their most frequent
//! value. Each statistic is computed independently from non-missing cells of
//! its own column.
//!
//! Deterministic choices:
//! - integer medians are rounded half away from zero;
//! - the date median is the floor of the median day number;
//! - most-frequent ties go to the lexicographically smallest value;
//! - a numeric column with no present values is filled with `0`, a text or
//!   date column with no present values is left untouched.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::table::{ColumnData, Table, Value};

/// Strategy used to compute a column's fill value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImputeStrategy {
    /// Median of present values. Numeric and date columns.
    Median,
    /// Most frequent present value. Text columns.
    MostFrequent,
}

/// Null estimator for the cleaned batch.
#[derive(Clone, Debug)]
pub struct NullEstimator {
    target: String,
    drop_missing_target: bool,
}

impl Default for NullEstimator {
    fn default() -> Self {
        Self::new("Price")
    }
}

impl NullEstimator {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            drop_missing_target: true,
        }
    }

    /// Whether rows with a missing target are dropped before any statistic is taken.
    pub fn with_drop_missing_target(mut self, drop: bool) -> Self {
        self.drop_missing_target = drop;
        self
    }

    /// Drop rows with a missing target (when enabled) and fill every other gap.
    ///
    /// # Errors
    /// [`PipelineError::EmptyData`] when no rows remain after dropping.
    pub fn estimate(&self, table: Table) -> Result<Table> {
        let mut table = if self.drop_missing_target {
            drop_missing_target(table, &self.target)
        } else {
            table
        };
        if table.is_empty() {
            return Err(PipelineError::EmptyData(
                "no rows left to estimate missing values from".to_string(),
            ));
        }

        for column in table.columns_mut() {
            let missing = column.data().missing_count();
            if missing == 0 {
                continue;
            }
            let strategy = strategy_for(column.data());
            let fill = fill_value(column.data(), strategy);
            if fill.is_missing() {
                warn!(column = column.name(), "no present values to impute from");
                continue;
            }
            debug!(column = column.name(), missing, ?strategy, fill = ?fill, "imputed column");
            fill_missing(column.data_mut(), &fill);
        }
        Ok(table)
    }
}

fn drop_missing_target(table: Table, target: &str) -> Table {
    let Some(column) = table.column(target) else {
        return table;
    };
    let keep: Vec<bool> = (0..column.len())
        .map(|row| !column.data().is_missing(row))
        .collect();
    let dropped = keep.iter().filter(|k| !**k).count();
    if dropped > 0 {
        warn!(column = target, dropped, "dropped rows with missing target");
    }
    table.filter_rows(&keep)
}

pub fn strategy_for(data: &ColumnData) -> ImputeStrategy {
    match data {
        ColumnData::Text(_) => ImputeStrategy::MostFrequent,
        _ => ImputeStrategy::Median,
    }
}

/// Compute the fill value of a column. `Value::Missing` when none exists.
pub fn fill_value(data: &ColumnData, strategy: ImputeStrategy) -> Value {
    match (data, strategy) {
        (ColumnData::Int(v), ImputeStrategy::Median) => {
            let present: Vec<f64> = v.iter().flatten().map(|&x| x as f64).collect();
            Value::Int(median(present).map_or(0, |m| m.round() as i64))
        }
        (ColumnData::Float(v), ImputeStrategy::Median) => {
            let present: Vec<f64> = v.iter().flatten().copied().collect();
            Value::Float(median(present).unwrap_or(0.0))
        }
        (ColumnData::Date(v), ImputeStrategy::Median) => {
            let days: Vec<f64> = v
                .iter()
                .flatten()
                .map(|d| f64::from(d.num_days_from_ce()))
                .collect();
            median(days)
                .and_then(|m| NaiveDate::from_num_days_from_ce_opt(m.floor() as i32))
                .map_or(Value::Missing, Value::Date)
        }
        (ColumnData::Text(v), _) => most_frequent(v.iter().flatten().map(String::as_str))
            .map_or(Value::Missing, |s| Value::Text(s.to_string())),
        // Most-frequent is a text statistic; other kinds use the median.
        (data, ImputeStrategy::MostFrequent) => fill_value(data, ImputeStrategy::Median),
    }
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let n = values.len();
    Some(if n % 2 == 0 {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    } else {
        values[n / 2]
    })
}

fn most_frequent<'a>(values: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    let best = counts.values().copied().max()?;
    // BTreeMap iterates in key order, so the first hit is the smallest tie.
    counts.into_iter().find(|(_, n)| *n == best).map(|(v, _)| v)
}

fn fill_missing(data: &mut ColumnData, fill: &Value) {
    match (data, fill) {
        (ColumnData::Int(v), Value::Int(x)) => fill_slots(v, *x),
        (ColumnData::Float(v), Value::Float(x)) => fill_slots(v, *x),
        (ColumnData::Text(v), Value::Text(x)) => fill_slots(v, x.clone()),
        (ColumnData::Date(v), Value::Date(x)) => fill_slots(v, *x),
        _ => {}
    }
}

fn fill_slots<T: Clone>(values: &mut [Option<T>], fill: T) {
    for slot in values.iter_mut().filter(|v| v.is_none()) {
        *slot = Some(fill.clone());
    }
}

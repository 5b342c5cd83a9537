//! Column-typed tables for property sale records.
//!
//! A [`Table`] is an ordered set of named, equally long [`Column`]s. Every column
//! carries exactly one value type ([`ColumnKind`]), so "text column" and
//! "numeric column" are structural facts rather than per-cell guesses. Cells may
//! be missing (`None`) until the null estimator has run.
//!
//! A [`Record`] is a single row keyed by column name. Single property records
//! submitted for inference are assembled as records and lifted into one-row
//! tables so that they flow through exactly the same code as the batch path.

pub mod csv_io;

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::error::{PipelineError, Result};

/// A single cell value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Missing,
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric view of the cell. Integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer view of the cell. Floats convert only when integral.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Missing, Into::into)
    }
}

/// Value type of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Int,
    Float,
    Text,
    Date,
}

impl ColumnKind {
    pub fn is_text(self) -> bool {
        self == ColumnKind::Text
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Int | ColumnKind::Float)
    }

    pub fn name(self) -> &'static str {
        match self {
            ColumnKind::Int => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Text => "text",
            ColumnKind::Date => "date",
        }
    }
}

/// Typed storage of one column.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnData {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Date(Vec<Option<NaiveDate>>),
}

impl ColumnData {
    pub fn empty(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Int => ColumnData::Int(Vec::new()),
            ColumnKind::Float => ColumnData::Float(Vec::new()),
            ColumnKind::Text => ColumnData::Text(Vec::new()),
            ColumnKind::Date => ColumnData::Date(Vec::new()),
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Int(_) => ColumnKind::Int,
            ColumnData::Float(_) => ColumnKind::Float,
            ColumnData::Text(_) => ColumnKind::Text,
            ColumnData::Date(_) => ColumnKind::Date,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::Date(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, row: usize) -> Value {
        match self {
            ColumnData::Int(v) => v.get(row).copied().flatten().into(),
            ColumnData::Float(v) => v.get(row).copied().flatten().into(),
            ColumnData::Text(v) => v.get(row).cloned().flatten().into(),
            ColumnData::Date(v) => v.get(row).copied().flatten().into(),
        }
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnData::Int(v) => v[row].is_none(),
            ColumnData::Float(v) => v[row].is_none(),
            ColumnData::Text(v) => v[row].is_none(),
            ColumnData::Date(v) => v[row].is_none(),
        }
    }

    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&row| self.is_missing(row)).count()
    }

    /// Number of distinct present values.
    pub fn distinct_count(&self) -> usize {
        fn count<T: Ord>(v: &[Option<T>]) -> usize {
            v.iter().flatten().collect::<BTreeSet<_>>().len()
        }
        match self {
            ColumnData::Int(v) => count(v),
            ColumnData::Float(v) => {
                let bits: Vec<Option<u64>> = v.iter().map(|x| x.map(f64::to_bits)).collect();
                count(&bits)
            }
            ColumnData::Text(v) => count(v),
            ColumnData::Date(v) => count(v),
        }
    }

    /// Append a value, checking it against the column type.
    ///
    /// `Missing` fits every column; integers are accepted by float columns.
    pub fn push(&mut self, value: Value) -> Result<()> {
        match (self, value) {
            (ColumnData::Int(v), Value::Missing) => v.push(None),
            (ColumnData::Float(v), Value::Missing) => v.push(None),
            (ColumnData::Text(v), Value::Missing) => v.push(None),
            (ColumnData::Date(v), Value::Missing) => v.push(None),
            (ColumnData::Int(v), Value::Int(x)) => v.push(Some(x)),
            (ColumnData::Float(v), Value::Float(x)) => v.push(Some(x)),
            (ColumnData::Float(v), Value::Int(x)) => v.push(Some(x as f64)),
            (ColumnData::Text(v), Value::Text(x)) => v.push(Some(x)),
            (ColumnData::Date(v), Value::Date(x)) => v.push(Some(x)),
            (data, value) => {
                return Err(PipelineError::InvalidParameter(format!(
                    "cannot store {:?} in a {} column",
                    value,
                    data.kind().name()
                )))
            }
        }
        Ok(())
    }

    pub fn take(&self, indices: &[usize]) -> Self {
        fn pick<T: Clone>(v: &[Option<T>], indices: &[usize]) -> Vec<Option<T>> {
            indices.iter().map(|&i| v[i].clone()).collect()
        }
        match self {
            ColumnData::Int(v) => ColumnData::Int(pick(v, indices)),
            ColumnData::Float(v) => ColumnData::Float(pick(v, indices)),
            ColumnData::Text(v) => ColumnData::Text(pick(v, indices)),
            ColumnData::Date(v) => ColumnData::Date(pick(v, indices)),
        }
    }
}

/// A named column.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn int(name: impl Into<String>, values: Vec<Option<i64>>) -> Self {
        Self::new(name, ColumnData::Int(values))
    }

    pub fn float(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Float(values))
    }

    pub fn text<S: Into<String>>(name: impl Into<String>, values: Vec<Option<S>>) -> Self {
        Self::new(
            name,
            ColumnData::Text(values.into_iter().map(|v| v.map(Into::into)).collect()),
        )
    }

    pub fn date(name: impl Into<String>, values: Vec<Option<NaiveDate>>) -> Self {
        Self::new(name, ColumnData::Date(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut ColumnData {
        &mut self.data
    }

    pub fn kind(&self) -> ColumnKind {
        self.data.kind()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_data(self) -> ColumnData {
        self.data
    }
}

/// Ordered collection of equally long, uniquely named columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table, rejecting duplicate names and ragged columns.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut table = Self::new();
        for column in columns {
            if table.contains(column.name()) {
                return Err(PipelineError::InvalidParameter(format!(
                    "duplicate column '{}'",
                    column.name()
                )));
            }
            table.set_column(column)?;
        }
        Ok(table)
    }

    /// Build a table from row records.
    ///
    /// Column order follows first appearance across records. A column's type is
    /// taken from its non-missing values; mixed integer/float columns widen to
    /// float and all-missing columns become float.
    pub fn from_records(records: &[Record]) -> Result<Self> {
        let mut names: Vec<&str> = Vec::new();
        for record in records {
            for (name, _) in record.iter() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let mut kind: Option<ColumnKind> = None;
            for value in records.iter().filter_map(|r| r.get(name)) {
                let value_kind = match value {
                    Value::Missing => continue,
                    Value::Int(_) => ColumnKind::Int,
                    Value::Float(_) => ColumnKind::Float,
                    Value::Text(_) => ColumnKind::Text,
                    Value::Date(_) => ColumnKind::Date,
                };
                kind = Some(match (kind, value_kind) {
                    (None, k) => k,
                    (Some(ColumnKind::Int), ColumnKind::Float)
                    | (Some(ColumnKind::Float), ColumnKind::Int) => ColumnKind::Float,
                    (Some(k), v) if k == v => k,
                    (Some(k), v) => {
                        return Err(PipelineError::ColumnType {
                            column: name.to_string(),
                            expected: if k == ColumnKind::Text || v == ColumnKind::Text {
                                "consistently text or non-text"
                            } else {
                                "a single value type"
                            },
                        })
                    }
                });
            }

            let mut data = ColumnData::empty(kind.unwrap_or(ColumnKind::Float));
            for record in records {
                data.push(record.get(name).cloned().unwrap_or(Value::Missing))?;
            }
            columns.push(Column::new(name, data));
        }
        Self::from_columns(columns)
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Like [`Table::column`], but absence is an error.
    pub fn require(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Replace the column with the same name in place, or append it.
    pub fn set_column(&mut self, column: Column) -> Result<()> {
        let others = self.columns.iter().filter(|c| c.name != column.name).count();
        if others > 0 {
            let expected = self
                .columns
                .iter()
                .find(|c| c.name != column.name)
                .map_or(0, Column::len);
            if column.len() != expected {
                return Err(PipelineError::ColumnLength {
                    column: column.name,
                    expected,
                    got: column.data.len(),
                });
            }
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(slot) => *slot = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }

    /// Rename a column in place. Returns `false` when `from` is absent.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_mut(from) {
            Some(column) => {
                column.name = to.to_string();
                true
            }
            None => false,
        }
    }

    /// New table with exactly the named columns, in the given order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Table> {
        let columns = names
            .iter()
            .map(|n| self.require(n.as_ref()).cloned())
            .collect::<Result<Vec<_>>>()?;
        Table::from_columns(columns)
    }

    /// Move the named columns to the front in the given order. Columns not
    /// named keep their relative order after them; unknown names are ignored.
    pub fn with_column_order<S: AsRef<str>>(mut self, names: &[S]) -> Table {
        let mut ordered = Vec::with_capacity(self.columns.len());
        for name in names {
            if let Some(idx) = self.columns.iter().position(|c| c.name == name.as_ref()) {
                ordered.push(self.columns.remove(idx));
            }
        }
        ordered.append(&mut self.columns);
        Table { columns: ordered }
    }

    pub fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.data.take(indices)))
                .collect(),
        }
    }

    pub fn filter_rows(&self, keep: &[bool]) -> Table {
        let indices: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter_map(|(i, &k)| k.then_some(i))
            .collect();
        self.take_rows(&indices)
    }

    pub fn value(&self, row: usize, name: &str) -> Value {
        self.column(name)
            .map_or(Value::Missing, |c| c.data.get(row))
    }

    pub fn row(&self, row: usize) -> Record {
        let mut record = Record::new();
        for column in &self.columns {
            record.set(column.name.clone(), column.data.get(row));
        }
        record
    }
}

/// One row keyed by column name, in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}

//! Delimited-file input and output for tables.
//!
//! Column types are inferred per column: integer when every non-empty cell
//! parses as `i64`, float when every non-empty cell parses as `f64`, text
//! otherwise. Empty cells are missing. Dates are written as `YYYY-MM-DD`.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tracing::info;

use super::{Column, ColumnData, Table};
use crate::error::Result;

/// Read a table from a CSV file with a header row.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let table = read_table_from(File::open(path)?)?;
    info!(
        path = %path.display(),
        rows = table.n_rows(),
        columns = table.n_cols(),
        "loaded table"
    );
    Ok(table)
}

/// Read a table from any CSV source with a header row.
pub fn read_table_from<R: Read>(reader: R) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

    for record in reader.records() {
        let record = record?;
        for (col, cell) in record.iter().enumerate() {
            let cell = cell.trim();
            cells[col].push((!cell.is_empty()).then(|| cell.to_string()));
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::new(name, infer_column(values)))
        .collect();
    Table::from_columns(columns)
}

fn infer_column(values: Vec<Option<String>>) -> ColumnData {
    let present = || values.iter().flatten();

    if present().all(|v| v.parse::<i64>().is_ok()) {
        return ColumnData::Int(
            values
                .iter()
                .map(|v| v.as_ref().and_then(|s| s.parse().ok()))
                .collect(),
        );
    }
    if present().all(|v| v.parse::<f64>().is_ok()) {
        return ColumnData::Float(
            values
                .iter()
                .map(|v| v.as_ref().and_then(|s| s.parse().ok()))
                .collect(),
        );
    }
    ColumnData::Text(values)
}

/// Write a table as CSV with a header row.
pub fn write_table<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    write_table_to(table, File::create(path)?)?;
    info!(
        path = %path.display(),
        rows = table.n_rows(),
        columns = table.n_cols(),
        "wrote table"
    );
    Ok(())
}

pub fn write_table_to<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(table.column_names())?;

    for row in 0..table.n_rows() {
        let fields = table.columns().iter().map(|c| match c.data() {
            ColumnData::Int(v) => v[row].map(|x| x.to_string()).unwrap_or_default(),
            ColumnData::Float(v) => v[row].map(|x| x.to_string()).unwrap_or_default(),
            ColumnData::Text(v) => v[row].clone().unwrap_or_default(),
            ColumnData::Date(v) => v[row]
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        });
        writer.write_record(fields)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ColumnKind, Value};

    const RAW: &str = "\
Suburb,Rooms,Price,Lattitude,Date
Abbotsford,2,1480000,-37.7996,3/12/2016
Abbotsford,3,,-37.8079,4/02/2016
Airport West,,840000.0,,4/03/2017
";

    #[test]
    fn test_read_infers_column_kinds() {
        let table = read_table_from(RAW.as_bytes()).unwrap();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.require("Suburb").unwrap().kind(), ColumnKind::Text);
        assert_eq!(table.require("Rooms").unwrap().kind(), ColumnKind::Int);
        assert_eq!(table.require("Price").unwrap().kind(), ColumnKind::Float);
        assert_eq!(table.require("Lattitude").unwrap().kind(), ColumnKind::Float);
        assert_eq!(table.require("Date").unwrap().kind(), ColumnKind::Text);
        assert_eq!(table.value(2, "Rooms"), Value::Missing);
        assert_eq!(table.value(1, "Price"), Value::Missing);
    }

    #[test]
    fn test_write_then_read_keeps_values() {
        let table = read_table_from(RAW.as_bytes()).unwrap();
        let mut buf = Vec::new();
        write_table_to(&table, &mut buf).unwrap();
        let reread = read_table_from(buf.as_slice()).unwrap();
        assert_eq!(reread.value(0, "Suburb"), table.value(0, "Suburb"));
        assert_eq!(reread.value(2, "Rooms"), Value::Missing);
        assert_eq!(reread.value(0, "Lattitude"), Value::Float(-37.7996));
    }
}

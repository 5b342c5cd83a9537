//! Schema normalizer: domain column names and consistent numeric types.

use tracing::debug;

use crate::table::{ColumnData, ColumnKind, Table};

/// Raw column names of the training file and their domain names.
pub const COLUMN_RENAMES: [(&str, &str); 13] = [
    ("Type", "UnitType"),
    ("Method", "SaleMethod"),
    ("SellerG", "RealEstateAgent"),
    ("Date", "SaleDate"),
    ("Distance", "DistanceToCBD"),
    ("Bedroom2", "Bedrooms"),
    ("Bathroom", "Bathrooms"),
    ("Car", "CarSpots"),
    ("Landsize", "LandSize"),
    ("Lattitude", "Latitude"),
    ("Longtitude", "Longitude"),
    ("Regionname", "RegionName"),
    ("Propertycount", "NeighbouringProperties"),
];

/// Magnitude-like columns that stay floating point. Every other numeric column
/// holds counts or codes and is stored as an integer.
pub const FLOAT_COLUMNS: [&str; 4] = ["DistanceToCBD", "BuildingArea", "Latitude", "Longitude"];

/// Columns that are numeric by definition, whatever the file's cells look like.
pub const NUMERIC_COLUMNS: [&str; 13] = [
    "Rooms",
    "Price",
    "DistanceToCBD",
    "Postcode",
    "Bedrooms",
    "Bathrooms",
    "CarSpots",
    "LandSize",
    "BuildingArea",
    "YearBuilt",
    "Latitude",
    "Longitude",
    "NeighbouringProperties",
];

/// Rename raw columns to their domain names. Absent columns are skipped.
pub fn rename_columns(mut table: Table) -> Table {
    for (from, to) in COLUMN_RENAMES {
        if table.rename_column(from, to) {
            debug!(from, to, "renamed column");
        }
    }
    table
}

/// Coerce numeric columns to their storage type.
///
/// Columns in [`FLOAT_COLUMNS`] become floats and every other numeric column
/// becomes an integer. Cells that cannot be represented (unparseable text,
/// fractional values in integer columns) become missing instead of failing.
pub fn coerce_numeric_types(mut table: Table) -> Table {
    for column in table.columns_mut() {
        let should_be_numeric =
            column.kind().is_numeric() || NUMERIC_COLUMNS.contains(&column.name());
        if !should_be_numeric {
            continue;
        }
        let target = if FLOAT_COLUMNS.contains(&column.name()) {
            ColumnKind::Float
        } else {
            ColumnKind::Int
        };
        if column.kind() == target {
            continue;
        }

        let before = column.data().missing_count();
        let data = coerce(column.data(), target);
        let after = data.missing_count();
        if after > before {
            debug!(
                column = column.name(),
                coerced_to_missing = after - before,
                "numeric coercion dropped cells"
            );
        }
        *column.data_mut() = data;
    }
    table
}

/// [`rename_columns`] followed by [`coerce_numeric_types`].
pub fn normalize_schema(table: Table) -> Table {
    coerce_numeric_types(rename_columns(table))
}

fn coerce(data: &ColumnData, target: ColumnKind) -> ColumnData {
    let as_f64: Vec<Option<f64>> = match data {
        ColumnData::Int(v) => v.iter().map(|x| x.map(|x| x as f64)).collect(),
        ColumnData::Float(v) => v.clone(),
        ColumnData::Text(v) => v
            .iter()
            .map(|x| x.as_deref().and_then(|s| s.trim().parse::<f64>().ok()))
            .collect(),
        ColumnData::Date(v) => vec![None; v.len()],
    };
    let as_f64 = as_f64
        .into_iter()
        .map(|x| x.filter(|v| v.is_finite()));

    match target {
        ColumnKind::Int => ColumnData::Int(
            as_f64
                .map(|x| x.filter(|v| v.fract() == 0.0).map(|v| v as i64))
                .collect(),
        ),
        _ => ColumnData::Float(as_f64.collect()),
    }
}

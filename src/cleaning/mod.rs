//! Cleaning stages that turn raw sale records into cleaned records.
//!
//! | Stage | Function |
//! |-------|----------|
//! | Schema normalizer | [`schema::normalize_schema`] |
//! | Cell formatter | [`format::format_table`] |
//! | Null estimator | [`imputation::NullEstimator`] |
//! | Deduplicator | [`dedup::drop_duplicates`] |
//!
//! [`clean_table`] runs them in that order, with the canonical column order
//! applied after formatting.

pub mod dedup;
pub mod format;
pub mod imputation;
pub mod schema;

pub use dedup::drop_duplicates;
pub use format::{format_record, format_table, normalize_text, SEPARATOR_SET_VERSION};
pub use imputation::{ImputeStrategy, NullEstimator};
pub use schema::normalize_schema;

use tracing::info;

use crate::error::Result;
use crate::features::reorder::reorder_columns;
use crate::table::Table;

/// Run the full cleaning chain over a raw training table.
///
/// # Errors
/// Fails on a malformed sale date or when no rows survive target dropping.
pub fn clean_table(raw: Table, nulls: &NullEstimator) -> Result<Table> {
    let rows_in = raw.n_rows();
    let table = normalize_schema(raw);
    let table = format_table(table)?;
    let table = reorder_columns(table);
    let table = nulls.estimate(table)?;
    let table = drop_duplicates(table);
    info!(
        rows_in,
        rows_out = table.n_rows(),
        columns = table.n_cols(),
        "cleaned table"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::csv_io::read_table_from;
    use crate::table::{ColumnKind, Value};

    const RAW: &str = "\
Suburb,Address,Rooms,Type,Price,Method,SellerG,Date,Distance,Postcode,Bedroom2,Bathroom,Car,Landsize,BuildingArea,YearBuilt,CouncilArea,Lattitude,Longtitude,Regionname,Propertycount
Abbotsford,85 Turner St,2,h,1480000,S,Biggin,3/12/2016,2.5,3067,2,1,1,202,,,Yarra City Council,-37.7996,144.9984,Northern Metropolitan,4019
Abbotsford,25 Bloomburg St,2,h,1035000,S,Biggin,4/02/2016,2.5,3067,2,1,0,156,79,1900,Yarra City Council,-37.8079,144.9934,Northern Metropolitan,4019
Abbotsford,5 Charles St,3,h,1465000,SP,Biggin,4/03/2017,2.5,3067,3,2,0,134,150,1900,Yarra City Council,-37.8093,144.9944,Northern Metropolitan,4019
Abbotsford,5 Charles St,3,h,1465000,SP,Biggin,4/03/2017,2.5,3067,3,2,0,134,150,1900,Yarra City Council,-37.8093,144.9944,Northern Metropolitan,4019
Abbotsford,40 Federation La,3,h,,PI,Biggin,4/03/2017,2.5,3067,3,2,1,94,,,Yarra City Council,-37.7969,144.9969,Northern Metropolitan,4019
";

    #[test]
    fn test_clean_table_end_to_end() {
        let raw = read_table_from(RAW.as_bytes()).unwrap();
        let table = clean_table(raw, &NullEstimator::default()).unwrap();

        // One duplicate and one row without a price are gone.
        assert_eq!(table.n_rows(), 3);
        let names = table.column_names();
        assert_eq!(names.first(), Some(&"SaleDate"));
        assert_eq!(names.last(), Some(&"Price"));
        assert!(names.contains(&"RealEstateAgent"));

        assert_eq!(table.require("SaleDate").unwrap().kind(), ColumnKind::Date);
        assert_eq!(table.require("Price").unwrap().kind(), ColumnKind::Int);
        assert_eq!(table.value(0, "UnitType"), Value::Text("House".into()));
        assert_eq!(table.value(0, "CouncilArea"), Value::Text("Yarra_City".into()));
        assert_eq!(table.value(0, "Address"), Value::Text("85_Turner_St".into()));
        assert_eq!(table.value(0, "BuildingArea"), Value::Float(150.0));
        assert_eq!(table.value(0, "YearBuilt"), Value::Int(1900));
        for column in table.columns() {
            assert_eq!(column.data().missing_count(), 0, "{}", column.name());
        }
    }
}

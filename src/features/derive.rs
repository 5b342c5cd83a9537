//! Feature deriver.
//!
//! [`derive`] is the only place where sale-date parts, street parts and the
//! three ratios are computed. [`FeatureDeriver::engineer`] applies it to every
//! row of a batch; the serving path applies it to a one-row table, so training
//! and inference cannot drift apart.
//!
//! Zero-divisor policies differ per field and are deliberate:
//! `BuildingToLandRatio` is always `1.0` when `LandSize == 0`, while
//! `AvgRoomSize` with `Rooms == 0` follows a configurable [`RoomSizePolicy`].

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::street_types::expand_street_type;
use crate::cleaning::normalize_text;
use crate::error::Result;
use crate::table::{Column, Record, Table};

/// Value of `BuildingToLandRatio` when the land size is zero.
pub const LAND_RATIO_ZERO_SUBSTITUTE: f64 = 1.0;

/// Columns consumed by the deriver and absent from engineered records.
pub const CONSUMED_COLUMNS: [&str; 2] = ["Address", "SaleDate"];

/// What `AvgRoomSize` becomes when a record has zero rooms.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum RoomSizePolicy {
    /// Use this value instead of dividing.
    Substitute(f64),
    /// Leave the field missing.
    Missing,
}

impl Default for RoomSizePolicy {
    fn default() -> Self {
        RoomSizePolicy::Substitute(1.0)
    }
}

/// Calendar parts of a sale date. Day of week counts from Monday = 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaleDateParts {
    pub year: i32,
    pub quarter: u32,
    pub month: u32,
    pub day: u32,
    pub day_of_week: u32,
}

impl SaleDateParts {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: (date.month() - 1) / 3 + 1,
            month: date.month(),
            day: date.day(),
            day_of_week: date.weekday().num_days_from_monday(),
        }
    }
}

/// Street name and full street type from a normalized address such as
/// `123_Example_St`. Addresses with a single token get the default type.
///
/// The street type is normalized like any other text cell, so `Mw` becomes
/// `Meander_Way`.
pub fn split_address(address: &str) -> (String, String) {
    let tokens: Vec<&str> = address.split('_').collect();
    match tokens.as_slice() {
        [.., name, code] => (name.to_string(), normalize_text(expand_street_type(code))),
        _ => (address.to_string(), normalize_text(expand_street_type(""))),
    }
}

/// Years between construction and sale. Negative when built after the sale.
pub fn property_age(sale_year: i64, year_built: i64) -> i64 {
    sale_year - year_built
}

pub fn avg_room_size(building_area: f64, rooms: i64, policy: RoomSizePolicy) -> Option<f64> {
    if rooms == 0 {
        return match policy {
            RoomSizePolicy::Substitute(v) => Some(v),
            RoomSizePolicy::Missing => None,
        };
    }
    Some(building_area / rooms as f64)
}

pub fn building_to_land_ratio(building_area: f64, land_size: f64) -> f64 {
    if land_size == 0.0 {
        LAND_RATIO_ZERO_SUBSTITUTE
    } else {
        building_area / land_size
    }
}

/// Fields of one record the deriver reads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeriveInput {
    pub sale_date: Option<NaiveDate>,
    /// Used for the property age when the sale date was already split.
    pub sale_year: Option<i64>,
    pub address: Option<String>,
    pub year_built: Option<i64>,
    pub building_area: Option<f64>,
    pub rooms: Option<i64>,
    pub land_size: Option<f64>,
}

impl DeriveInput {
    pub fn from_row(table: &Table, row: usize) -> Self {
        Self {
            sale_date: table.value(row, "SaleDate").as_date(),
            sale_year: table.value(row, "SaleYear").as_i64(),
            address: table.value(row, "Address").as_str().map(str::to_string),
            year_built: table.value(row, "YearBuilt").as_i64(),
            building_area: table.value(row, "BuildingArea").as_f64(),
            rooms: table.value(row, "Rooms").as_i64(),
            land_size: table.value(row, "LandSize").as_f64(),
        }
    }
}

/// Fields the deriver produces. `None` where an input was missing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DerivedFields {
    pub sale: Option<SaleDateParts>,
    pub street_name: Option<String>,
    pub street_type: Option<String>,
    pub property_age: Option<i64>,
    pub avg_room_size: Option<f64>,
    pub building_to_land_ratio: Option<f64>,
}

/// Derive every engineered field of one record.
pub fn derive(input: &DeriveInput, policy: RoomSizePolicy) -> DerivedFields {
    let sale = input.sale_date.map(SaleDateParts::from_date);
    let sale_year = sale.map(|s| i64::from(s.year)).or(input.sale_year);
    let (street_name, street_type) = match input.address.as_deref() {
        Some(address) => {
            let (name, kind) = split_address(address);
            (Some(name), Some(kind))
        }
        None => (None, None),
    };

    let building_to_land_ratio = match (input.building_area, input.land_size) {
        (_, Some(land)) if land == 0.0 => Some(LAND_RATIO_ZERO_SUBSTITUTE),
        (Some(area), Some(land)) => Some(building_to_land_ratio(area, land)),
        _ => None,
    };

    DerivedFields {
        sale,
        street_name,
        street_type,
        property_age: sale_year
            .zip(input.year_built)
            .map(|(sold, built)| property_age(sold, built)),
        avg_room_size: input
            .building_area
            .zip(input.rooms)
            .and_then(|(area, rooms)| avg_room_size(area, rooms, policy)),
        building_to_land_ratio,
    }
}

/// Applies [`derive`] to tables and records.
#[derive(Clone, Copy, Debug, Default)]
pub struct FeatureDeriver {
    room_size_policy: RoomSizePolicy,
}

impl FeatureDeriver {
    pub fn new(room_size_policy: RoomSizePolicy) -> Self {
        Self { room_size_policy }
    }

    /// Add derived columns and drop `Address` and `SaleDate`.
    ///
    /// A derived column is only added when the columns it is computed from
    /// exist, so a table that was already engineered passes through with the
    /// same values.
    pub fn engineer(&self, mut table: Table) -> Result<Table> {
        let derived: Vec<DerivedFields> = (0..table.n_rows())
            .map(|row| derive(&DeriveInput::from_row(&table, row), self.room_size_policy))
            .collect();

        let has = |name: &str| table.contains(name);
        let has_sale_date = has("SaleDate");
        let has_address = has("Address");
        let has_age = (has_sale_date || has("SaleYear")) && has("YearBuilt");
        let has_room_size = has("BuildingArea") && has("Rooms");
        let has_land_ratio = has("LandSize");

        let mut columns = Vec::new();
        if has_sale_date {
            let part = |f: fn(&SaleDateParts) -> i64| -> Vec<Option<i64>> {
                derived.iter().map(|d| d.sale.as_ref().map(f)).collect()
            };
            columns.push(Column::int("SaleYear", part(|s| i64::from(s.year))));
            columns.push(Column::int("SaleQuarter", part(|s| i64::from(s.quarter))));
            columns.push(Column::int("SaleMonth", part(|s| i64::from(s.month))));
            columns.push(Column::int("SaleDay", part(|s| i64::from(s.day))));
            columns.push(Column::int("SaleDayOfWeek", part(|s| i64::from(s.day_of_week))));
        }
        if has_address {
            columns.push(Column::text(
                "StreetName",
                derived.iter().map(|d| d.street_name.clone()).collect(),
            ));
            columns.push(Column::text(
                "StreetType",
                derived.iter().map(|d| d.street_type.clone()).collect(),
            ));
        }
        if has_age {
            let ages: Vec<Option<i64>> = derived.iter().map(|d| d.property_age).collect();
            let negative = ages.iter().flatten().filter(|a| **a < 0).count();
            if negative > 0 {
                warn!(rows = negative, "negative PropertyAge: built after the sale");
            }
            columns.push(Column::int("PropertyAge", ages));
        }
        if has_room_size {
            columns.push(Column::float(
                "AvgRoomSize",
                derived.iter().map(|d| d.avg_room_size).collect(),
            ));
        }
        if has_land_ratio {
            columns.push(Column::float(
                "BuildingToLandRatio",
                derived.iter().map(|d| d.building_to_land_ratio).collect(),
            ));
        }

        for name in CONSUMED_COLUMNS {
            table.remove_column(name);
        }
        let added = columns.len();
        for column in columns {
            table.set_column(column)?;
        }
        debug!(rows = table.n_rows(), added, "derived features");
        Ok(table)
    }

    /// [`FeatureDeriver::engineer`] on a single record.
    pub fn derive_record(&self, record: &Record) -> Result<Record> {
        let table = self.engineer(Table::from_records(std::slice::from_ref(record))?)?;
        Ok(table.row(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_sale_date_parts() {
        let parts = SaleDateParts::from_date(date(2017, 3, 15));
        assert_eq!(parts.year, 2017);
        assert_eq!(parts.quarter, 1);
        assert_eq!(parts.month, 3);
        assert_eq!(parts.day, 15);
        assert_eq!(parts.day_of_week, 2);

        let parts = SaleDateParts::from_date(date(2016, 12, 3));
        assert_eq!(parts.quarter, 4);
        assert_eq!(parts.day_of_week, 5);
    }

    #[test]
    fn test_split_address() {
        assert_eq!(
            split_address("123_Example_Street"),
            ("Example".to_string(), "Street".to_string())
        );
        assert_eq!(
            split_address("85_Turner_Rd"),
            ("Turner".to_string(), "Road".to_string())
        );
        assert_eq!(
            split_address("1_Smith_Xyz"),
            ("Smith".to_string(), "Street".to_string())
        );
        assert_eq!(
            split_address("4_Lakeside_Mw"),
            ("Lakeside".to_string(), "Meander_Way".to_string())
        );
        assert_eq!(
            split_address("Nowhere"),
            ("Nowhere".to_string(), "Street".to_string())
        );
    }

    #[test]
    fn test_building_to_land_ratio() {
        assert_eq!(building_to_land_ratio(120.0, 0.0), 1.0);
        assert_eq!(building_to_land_ratio(120.0, 300.0), 0.4);
    }

    #[test]
    fn test_avg_room_size_zero_rooms() {
        assert_eq!(avg_room_size(120.0, 3, RoomSizePolicy::default()), Some(40.0));
        assert_eq!(avg_room_size(120.0, 0, RoomSizePolicy::default()), Some(1.0));
        assert_eq!(avg_room_size(120.0, 0, RoomSizePolicy::Missing), None);
    }

    #[test]
    fn test_property_age_is_signed() {
        assert_eq!(property_age(2017, 1900), 117);
        assert_eq!(property_age(2016, 2018), -2);
    }

    fn cleaned() -> Table {
        Table::from_columns(vec![
            Column::text("Address", vec![Some("123_Example_Street"), Some("4_Kent_Ct")]),
            Column::date("SaleDate", vec![Some(date(2017, 3, 15)), Some(date(2016, 12, 3))]),
            Column::int("YearBuilt", vec![Some(1990), Some(2018)]),
            Column::float("BuildingArea", vec![Some(120.0), Some(120.0)]),
            Column::int("Rooms", vec![Some(3), Some(0)]),
            Column::int("LandSize", vec![Some(300), Some(0)]),
            Column::int("Price", vec![Some(1_000_000), Some(800_000)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_engineer_table() {
        let table = FeatureDeriver::default().engineer(cleaned()).unwrap();
        assert!(!table.contains("Address"));
        assert!(!table.contains("SaleDate"));
        assert_eq!(table.value(0, "SaleYear"), Value::Int(2017));
        assert_eq!(table.value(0, "SaleQuarter"), Value::Int(1));
        assert_eq!(table.value(0, "SaleMonth"), Value::Int(3));
        assert_eq!(table.value(0, "SaleDay"), Value::Int(15));
        assert_eq!(table.value(0, "SaleDayOfWeek"), Value::Int(2));
        assert_eq!(table.value(0, "StreetName"), Value::Text("Example".into()));
        assert_eq!(table.value(0, "StreetType"), Value::Text("Street".into()));
        assert_eq!(table.value(1, "StreetType"), Value::Text("Court".into()));
        assert_eq!(table.value(0, "PropertyAge"), Value::Int(27));
        assert_eq!(table.value(1, "PropertyAge"), Value::Int(-2));
        assert_eq!(table.value(0, "AvgRoomSize"), Value::Float(40.0));
        assert_eq!(table.value(1, "AvgRoomSize"), Value::Float(1.0));
        assert_eq!(table.value(0, "BuildingToLandRatio"), Value::Float(0.4));
        assert_eq!(table.value(1, "BuildingToLandRatio"), Value::Float(1.0));
        assert_eq!(table.value(1, "Price"), Value::Int(800_000));
    }

    #[test]
    fn test_engineered_record_with_zero_land_keeps_ratio_one() {
        let deriver = FeatureDeriver::default();
        let engineered = deriver.engineer(cleaned()).unwrap();
        let again = deriver.engineer(engineered.clone()).unwrap();
        assert_eq!(again.value(1, "BuildingToLandRatio"), Value::Float(1.0));
        assert_eq!(again, engineered);
    }

    #[test]
    fn test_derive_record_matches_batch() {
        let deriver = FeatureDeriver::default();
        let batch = deriver.engineer(cleaned()).unwrap();
        let single = deriver.derive_record(&cleaned().row(0)).unwrap();
        assert_eq!(single, batch.row(0));
    }

    #[test]
    fn test_missing_inputs_yield_missing_fields() {
        let fields = derive(&DeriveInput::default(), RoomSizePolicy::default());
        assert_eq!(fields, DerivedFields::default());

        let fields = derive(
            &DeriveInput {
                land_size: Some(0.0),
                ..DeriveInput::default()
            },
            RoomSizePolicy::default(),
        );
        assert_eq!(fields.building_to_land_ratio, Some(1.0));
    }
}

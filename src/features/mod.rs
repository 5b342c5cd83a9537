//! Feature engineering over cleaned records.
//!
//! - [`derive`]: date parts, street parts, property age and ratios
//! - [`street_types`]: street-type abbreviation table
//! - [`reorder`]: canonical column order

pub mod derive;
pub mod reorder;
pub mod street_types;

pub use derive::{FeatureDeriver, RoomSizePolicy, SaleDateParts};
pub use reorder::{canonical_order, reorder_columns, TARGET_COLUMN};
pub use street_types::expand_street_type;

use tracing::info;

use crate::error::Result;
use crate::table::Table;

/// Derive features and put the result in canonical column order.
pub fn engineer_table(table: Table, deriver: &FeatureDeriver) -> Result<Table> {
    let table = reorder_columns(deriver.engineer(table)?);
    info!(rows = table.n_rows(), columns = table.n_cols(), "engineered table");
    Ok(table)
}

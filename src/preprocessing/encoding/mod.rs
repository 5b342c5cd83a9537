//! Categorical encoders over text columns.
//!
//! ## OneHotEncoder
//! One indicator feature per category seen during fit.
//!
//! ## OrdinalEncoder
//! One feature per column holding the category's index in sorted order.
//!
//! Categories are kept sorted, so the learned state does not depend on the
//! order rows arrive in.

mod one_hot;
mod ordinal;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub use one_hot::{FittedOneHotEncoder, OneHotEncoder, OneHotEncoderParams};
pub use ordinal::{FittedOrdinalEncoder, OrdinalEncoder, OrdinalEncoderParams};

use super::cells::text_values;
use crate::error::Result;
use crate::table::Table;

/// Strategy for categories never seen during fit. Missing cells count as
/// unseen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleUnknown {
    /// Fail the transform.
    #[default]
    Error,
    /// Encode as the unknown representation: all-zero indicators for one-hot,
    /// the configured unknown value for ordinal.
    Ignore,
}

/// Sorted distinct present values of every column of `data`.
fn learn_categories(data: &Table) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let columns: Vec<String> = data.column_names().into_iter().map(String::from).collect();
    let categories = columns
        .iter()
        .map(|name| {
            let distinct: BTreeSet<&str> = text_values(data, name)?.into_iter().flatten().collect();
            Ok(distinct.into_iter().map(String::from).collect())
        })
        .collect::<Result<Vec<Vec<String>>>>()?;
    Ok((columns, categories))
}

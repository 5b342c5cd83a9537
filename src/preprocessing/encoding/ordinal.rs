//! Ordinal encoding for high-cardinality text columns.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::{learn_categories, HandleUnknown};
use crate::error::{PipelineError, Result};
use crate::preprocessing::cells::text_values;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use crate::table::Table;

/// Ordinal encoder for categorical features.
///
/// Maps each category to its index among the sorted categories seen during
/// fit. With [`HandleUnknown::Ignore`], unseen and missing values map to the
/// reserved `unknown_value` (default `-1.0`).
#[derive(Clone, Debug)]
pub struct OrdinalEncoder {
    handle_unknown: HandleUnknown,
    unknown_value: f64,
}

impl Default for OrdinalEncoder {
    fn default() -> Self {
        Self {
            handle_unknown: HandleUnknown::default(),
            unknown_value: -1.0,
        }
    }
}

impl OrdinalEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handle_unknown(mut self, strategy: HandleUnknown) -> Self {
        self.handle_unknown = strategy;
        self
    }

    pub fn with_unknown_value(mut self, value: f64) -> Self {
        self.unknown_value = value;
        self
    }
}

/// Serializable parameters for a fitted [`OrdinalEncoder`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrdinalEncoderParams {
    pub columns: Vec<String>,
    /// Sorted categories of each column; a category's ordinal is its index.
    pub categories: Vec<Vec<String>>,
    pub handle_unknown: HandleUnknown,
    pub unknown_value: f64,
}

impl Transformer for OrdinalEncoder {
    type Params = OrdinalEncoderParams;
    type Fitted = FittedOrdinalEncoder;

    fn fit(&self, data: &Table) -> Result<Self::Fitted> {
        // A table without columns is a valid, empty selection.
        if data.n_cols() > 0 && data.is_empty() {
            return Err(PipelineError::EmptyData(
                "cannot fit OrdinalEncoder on empty data".to_string(),
            ));
        }
        let reserved_is_ordinal = self.unknown_value >= 0.0 && self.unknown_value.fract() == 0.0;
        if self.handle_unknown == HandleUnknown::Ignore && reserved_is_ordinal {
            return Err(PipelineError::InvalidParameter(format!(
                "unknown_value {} could collide with a category ordinal",
                self.unknown_value
            )));
        }
        let (columns, categories) = learn_categories(data)?;
        Ok(FittedOrdinalEncoder {
            params: OrdinalEncoderParams {
                columns,
                categories,
                handle_unknown: self.handle_unknown,
                unknown_value: self.unknown_value,
            },
        })
    }
}

/// Fitted OrdinalEncoder ready for inference.
#[derive(Clone, Debug)]
pub struct FittedOrdinalEncoder {
    params: OrdinalEncoderParams,
}

impl FittedOrdinalEncoder {
    pub fn categories(&self) -> &[Vec<String>] {
        &self.params.categories
    }

    pub fn unknown_value(&self) -> f64 {
        self.params.unknown_value
    }
}

impl FittedTransformer for FittedOrdinalEncoder {
    type Params = OrdinalEncoderParams;

    fn transform(&self, data: &Table) -> Result<Array2<f64>> {
        let p = &self.params;
        let mut out = Array2::zeros((data.n_rows(), p.columns.len()));
        for (j, (name, cats)) in p.columns.iter().zip(&p.categories).enumerate() {
            for (row, value) in text_values(data, name)?.into_iter().enumerate() {
                out[[row, j]] =
                    match value.and_then(|v| cats.binary_search_by(|c| c.as_str().cmp(v)).ok()) {
                        Some(idx) => idx as f64,
                        None if p.handle_unknown == HandleUnknown::Ignore => p.unknown_value,
                        None => {
                            return Err(PipelineError::InvalidParameter(format!(
                                "unknown category {:?} in column '{}'",
                                value, name
                            )))
                        }
                    };
            }
        }
        Ok(out)
    }

    fn feature_names_out(&self) -> Vec<String> {
        self.params.columns.clone()
    }

    fn input_columns(&self) -> &[String] {
        &self.params.columns
    }

    fn extract_params(&self) -> Self::Params {
        self.params.clone()
    }

    fn from_params(params: Self::Params) -> Result<Self> {
        if params.categories.len() != params.columns.len() {
            return Err(PipelineError::Serialization(
                "OrdinalEncoder params have inconsistent lengths".to_string(),
            ));
        }
        Ok(Self { params })
    }
}

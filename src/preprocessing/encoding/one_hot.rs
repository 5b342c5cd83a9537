//! One-hot encoding for low-cardinality text columns.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::{learn_categories, HandleUnknown};
use crate::error::{PipelineError, Result};
use crate::preprocessing::cells::text_values;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use crate::table::Table;

/// One-hot encoder for categorical features.
///
/// Every input column expands into one indicator per category seen during
/// fit, in sorted category order. Feature names are `{column}_{category}`.
#[derive(Clone, Debug, Default)]
pub struct OneHotEncoder {
    handle_unknown: HandleUnknown,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handle_unknown(mut self, strategy: HandleUnknown) -> Self {
        self.handle_unknown = strategy;
        self
    }
}

/// Serializable parameters for a fitted [`OneHotEncoder`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoderParams {
    pub columns: Vec<String>,
    /// Sorted categories of each column.
    pub categories: Vec<Vec<String>>,
    pub handle_unknown: HandleUnknown,
}

impl Transformer for OneHotEncoder {
    type Params = OneHotEncoderParams;
    type Fitted = FittedOneHotEncoder;

    fn fit(&self, data: &Table) -> Result<Self::Fitted> {
        // A table without columns is a valid, empty selection.
        if data.n_cols() > 0 && data.is_empty() {
            return Err(PipelineError::EmptyData(
                "cannot fit OneHotEncoder on empty data".to_string(),
            ));
        }
        let (columns, categories) = learn_categories(data)?;
        Ok(FittedOneHotEncoder {
            params: OneHotEncoderParams {
                columns,
                categories,
                handle_unknown: self.handle_unknown,
            },
        })
    }
}

/// Fitted OneHotEncoder ready for inference.
#[derive(Clone, Debug)]
pub struct FittedOneHotEncoder {
    params: OneHotEncoderParams,
}

impl FittedOneHotEncoder {
    pub fn categories(&self) -> &[Vec<String>] {
        &self.params.categories
    }
}

impl FittedTransformer for FittedOneHotEncoder {
    type Params = OneHotEncoderParams;

    fn transform(&self, data: &Table) -> Result<Array2<f64>> {
        let p = &self.params;
        let width = p.categories.iter().map(Vec::len).sum();
        let mut out = Array2::zeros((data.n_rows(), width));

        let mut offset = 0;
        for (name, cats) in p.columns.iter().zip(&p.categories) {
            for (row, value) in text_values(data, name)?.into_iter().enumerate() {
                match value.and_then(|v| cats.binary_search_by(|c| c.as_str().cmp(v)).ok()) {
                    Some(idx) => out[[row, offset + idx]] = 1.0,
                    None if p.handle_unknown == HandleUnknown::Ignore => {}
                    None => {
                        return Err(PipelineError::InvalidParameter(format!(
                            "unknown category {:?} in column '{}'",
                            value, name
                        )))
                    }
                }
            }
            offset += cats.len();
        }
        Ok(out)
    }

    fn feature_names_out(&self) -> Vec<String> {
        self.params
            .columns
            .iter()
            .zip(&self.params.categories)
            .flat_map(|(name, cats)| cats.iter().map(move |c| format!("{}_{}", name, c)))
            .collect()
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
                "OneHotEncoder params have inconsistent lengths".to_string(),
            ));
        }
        Ok(Self { params })
    }
}

//! Feature encoder: a column transformer with three named blocks.
//!
//! | Block | Columns | Transformer |
//! |-------|---------|-------------|
//! | `scaler` | numeric columns | [`StandardScaler`] |
//! | `low_card_encoder` | text columns with at most `cardinality_threshold` categories | [`OneHotEncoder`] |
//! | `high_card_encoder` | remaining text columns | [`OrdinalEncoder`] |
//!
//! Output columns follow the block order above; inside a block they follow
//! the canonical column order of the fit table. Every block reads its columns
//! by name, so the encoder is insensitive to the column order of the table it
//! transforms. Unseen or missing categories never fail: one-hot indicators
//! stay zero and ordinals take the reserved `-1`. Missing numbers take the
//! fitted mean.

use ndarray::{concatenate, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::encoding::{
    FittedOneHotEncoder, FittedOrdinalEncoder, HandleUnknown, OneHotEncoder, OneHotEncoderParams,
    OrdinalEncoder, OrdinalEncoderParams,
};
use super::scaling::{FittedStandardScaler, StandardScaler, StandardScalerParams};
use super::traits::{FittedTransformer, Transformer};
use crate::error::{PipelineError, Result};
use crate::table::{ColumnKind, Table};

pub const SCALER_BLOCK: &str = "scaler";
pub const LOW_CARD_BLOCK: &str = "low_card_encoder";
pub const HIGH_CARD_BLOCK: &str = "high_card_encoder";

/// Default number of distinct values up to which a text column is one-hot encoded.
pub const DEFAULT_CARDINALITY_THRESHOLD: usize = 10;

/// Feature encoder (unfitted).
///
/// Distinct values are counted on the table passed to `fit`. The training
/// pipeline fits on the training split, so held-out rows never move a column
/// between the one-hot and ordinal blocks.
///
/// # Example
/// ```ignore
/// let encoder = FeatureEncoder::new()
///     .with_cardinality_threshold(10)
///     .with_target("Price");
/// let fitted = encoder.fit(&train)?;
/// let x = fitted.transform(&test)?;
/// ```
#[derive(Clone, Debug)]
pub struct FeatureEncoder {
    cardinality_threshold: usize,
    target: Option<String>,
}

impl Default for FeatureEncoder {
    fn default() -> Self {
        Self {
            cardinality_threshold: DEFAULT_CARDINALITY_THRESHOLD,
            target: Some(crate::features::TARGET_COLUMN.to_string()),
        }
    }
}

impl FeatureEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cardinality_threshold(mut self, threshold: usize) -> Self {
        self.cardinality_threshold = threshold;
        self
    }

    /// Column excluded from the features. `None` encodes every column.
    pub fn with_target(mut self, target: impl Into<Option<String>>) -> Self {
        self.target = target.into();
        self
    }
}

/// Serializable parameters for a fitted [`FeatureEncoder`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoderParams {
    pub cardinality_threshold: usize,
    /// Input columns in canonical order.
    pub columns: Vec<String>,
    pub scaler: StandardScalerParams,
    pub low_card: OneHotEncoderParams,
    pub high_card: OrdinalEncoderParams,
}

impl Transformer for FeatureEncoder {
    type Params = FeatureEncoderParams;
    type Fitted = FittedFeatureEncoder;

    fn fit(&self, data: &Table) -> Result<Self::Fitted> {
        if data.is_empty() {
            return Err(PipelineError::EmptyData(
                "cannot fit FeatureEncoder on empty data".to_string(),
            ));
        }

        let mut columns = Vec::new();
        let mut numeric = Vec::new();
        let mut low_card = Vec::new();
        let mut high_card = Vec::new();
        for column in data.columns() {
            let name = column.name();
            if self.target.as_deref() == Some(name) {
                continue;
            }
            match column.kind() {
                ColumnKind::Int | ColumnKind::Float => numeric.push(name),
                ColumnKind::Text => {
                    let distinct = column.data().distinct_count();
                    if distinct <= self.cardinality_threshold {
                        low_card.push(name);
                    } else {
                        high_card.push(name);
                    }
                }
                ColumnKind::Date => {
                    return Err(PipelineError::ColumnType {
                        column: name.to_string(),
                        expected: "numeric or text for encoding",
                    })
                }
            }
            columns.push(name.to_string());
        }

        let scaler = StandardScaler::new().fit(&data.select(&numeric)?)?;
        let low = OneHotEncoder::new()
            .with_handle_unknown(HandleUnknown::Ignore)
            .fit(&data.select(&low_card)?)?;
        let high = OrdinalEncoder::new()
            .with_handle_unknown(HandleUnknown::Ignore)
            .fit(&data.select(&high_card)?)?;

        let fitted = FittedFeatureEncoder {
            cardinality_threshold: self.cardinality_threshold,
            columns,
            scaler,
            low_card: low,
            high_card: high,
        };
        info!(
            rows = data.n_rows(),
            numeric = numeric.len(),
            low_card = low_card.len(),
            high_card = high_card.len(),
            features_out = fitted.n_features_out(),
            "fitted feature encoder"
        );
        Ok(fitted)
    }
}

/// Fitted FeatureEncoder ready for inference.
#[derive(Clone, Debug)]
pub struct FittedFeatureEncoder {
    cardinality_threshold: usize,
    columns: Vec<String>,
    scaler: FittedStandardScaler,
    low_card: FittedOneHotEncoder,
    high_card: FittedOrdinalEncoder,
}

impl FittedFeatureEncoder {
    pub fn cardinality_threshold(&self) -> usize {
        self.cardinality_threshold
    }

    pub fn numeric_columns(&self) -> &[String] {
        self.scaler.input_columns()
    }

    pub fn low_cardinality_columns(&self) -> &[String] {
        self.low_card.input_columns()
    }

    pub fn high_cardinality_columns(&self) -> &[String] {
        self.high_card.input_columns()
    }
}

impl FittedTransformer for FittedFeatureEncoder {
    type Params = FeatureEncoderParams;

    fn transform(&self, data: &Table) -> Result<Array2<f64>> {
        let blocks = [
            self.scaler.transform(data)?,
            self.low_card.transform(data)?,
            self.high_card.transform(data)?,
        ];
        let views: Vec<_> = blocks.iter().map(Array2::view).collect();
        let out = concatenate(Axis(1), &views)
            .map_err(|e| PipelineError::InvalidParameter(format!("feature blocks: {}", e)))?;
        debug!(rows = out.nrows(), features = out.ncols(), "encoded features");
        Ok(out)
    }

    fn feature_names_out(&self) -> Vec<String> {
        let prefixed = |block: &str, names: Vec<String>| -> Vec<String> {
            names
                .into_iter()
                .map(|n| format!("{}__{}", block, n))
                .collect()
        };
        let mut names = prefixed(SCALER_BLOCK, self.scaler.feature_names_out());
        names.extend(prefixed(LOW_CARD_BLOCK, self.low_card.feature_names_out()));
        names.extend(prefixed(HIGH_CARD_BLOCK, self.high_card.feature_names_out()));
        names
    }

    fn input_columns(&self) -> &[String] {
        &self.columns
    }

    fn n_features_out(&self) -> usize {
        self.scaler.n_features_out()
            + self.low_card.n_features_out()
            + self.high_card.n_features_out()
    }

    fn extract_params(&self) -> Self::Params {
        FeatureEncoderParams {
            cardinality_threshold: self.cardinality_threshold,
            columns: self.columns.clone(),
            scaler: self.scaler.extract_params(),
            low_card: self.low_card.extract_params(),
            high_card: self.high_card.extract_params(),
        }
    }

    fn from_params(params: Self::Params) -> Result<Self> {
        Ok(Self {
            cardinality_threshold: params.cardinality_threshold,
            columns: params.columns,
            scaler: FittedStandardScaler::from_params(params.scaler)?,
            low_card: FittedOneHotEncoder::from_params(params.low_card)?,
            high_card: FittedOrdinalEncoder::from_params(params.high_card)?,
        })
    }
}

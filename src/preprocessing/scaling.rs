//! Standard scaler for numeric columns.
//!
//! `z = (x - u) / s` with `u` the column mean and `s` the population standard
//! deviation of the training values. Missing cells are ignored during fit and
//! replaced by `u` at transform time, so they scale to `0.0`. Constant columns
//! get `s = 1.0`.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::cells::numeric_values;
use super::traits::{FittedTransformer, Transformer};
use crate::error::{PipelineError, Result};
use crate::table::Table;

/// Configuration for [`StandardScaler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardScalerConfig {
    /// Center data on the mean.
    pub with_mean: bool,
    /// Scale data to unit variance.
    pub with_std: bool,
}

impl Default for StandardScalerConfig {
    fn default() -> Self {
        Self {
            with_mean: true,
            with_std: true,
        }
    }
}

/// Serializable parameters for a fitted [`StandardScaler`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScalerParams {
    pub config: StandardScalerConfig,
    pub columns: Vec<String>,
    /// Per-column fill value for missing cells.
    pub mean: Vec<f64>,
    /// Per-column centering offset; zero when `with_mean` is off.
    pub offset: Vec<f64>,
    pub scale: Vec<f64>,
}

/// StandardScaler transformer (unfitted).
#[derive(Clone, Debug, Default)]
pub struct StandardScaler {
    config: StandardScalerConfig,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mean(mut self, with_mean: bool) -> Self {
        self.config.with_mean = with_mean;
        self
    }

    pub fn with_std(mut self, with_std: bool) -> Self {
        self.config.with_std = with_std;
        self
    }
}

fn mean_and_std(values: &[Option<f64>]) -> (f64, f64) {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return (0.0, 0.0);
    }
    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    let var = present.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

impl Transformer for StandardScaler {
    type Params = StandardScalerParams;
    type Fitted = FittedStandardScaler;

    fn fit(&self, data: &Table) -> Result<Self::Fitted> {
        // A table without columns is a valid, empty selection.
        if data.n_cols() > 0 && data.is_empty() {
            return Err(PipelineError::EmptyData(
                "cannot fit StandardScaler on empty data".to_string(),
            ));
        }

        let columns: Vec<String> = data.column_names().into_iter().map(String::from).collect();
        let mut mean = Vec::with_capacity(columns.len());
        let mut offset = Vec::with_capacity(columns.len());
        let mut scale = Vec::with_capacity(columns.len());
        for name in &columns {
            let (m, s) = mean_and_std(&numeric_values(data, name)?);
            mean.push(m);
            offset.push(if self.config.with_mean { m } else { 0.0 });
            scale.push(if self.config.with_std && s > 0.0 { s } else { 1.0 });
        }

        Ok(FittedStandardScaler {
            params: StandardScalerParams {
                config: self.config,
                columns,
                mean,
                offset,
                scale,
            },
        })
    }
}

/// Fitted StandardScaler ready for inference.
#[derive(Clone, Debug)]
pub struct FittedStandardScaler {
    params: StandardScalerParams,
}

impl FittedStandardScaler {
    pub fn mean(&self) -> &[f64] {
        &self.params.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.params.scale
    }
}

impl FittedTransformer for FittedStandardScaler {
    type Params = StandardScalerParams;

    fn transform(&self, data: &Table) -> Result<Array2<f64>> {
        let p = &self.params;
        let mut out = Array2::zeros((data.n_rows(), p.columns.len()));
        for (j, name) in p.columns.iter().enumerate() {
            let values = numeric_values(data, name)?;
            for (i, value) in values.into_iter().enumerate() {
                out[[i, j]] = (value.unwrap_or(p.mean[j]) - p.offset[j]) / p.scale[j];
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
        let n = params.columns.len();
        if params.mean.len() != n || params.offset.len() != n || params.scale.len() != n {
            return Err(PipelineError::Serialization(
                "StandardScaler params have inconsistent lengths".to_string(),
            ));
        }
        Ok(Self { params })
    }
}

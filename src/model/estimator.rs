//! One persisted artifact for whichever estimator was selected.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use super::{
    FittedKNeighborsRegressor, InferenceModel, KnnParams, LinearModel, LinearParams,
};
use crate::error::{PipelineError, Result};

/// Estimators the training harness knows how to fit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorKind {
    Ridge,
    Knn,
}

impl EstimatorKind {
    pub fn name(self) -> &'static str {
        match self {
            EstimatorKind::Ridge => "ridge",
            EstimatorKind::Knn => "knn",
        }
    }
}

impl fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EstimatorKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ridge" => Ok(EstimatorKind::Ridge),
            "knn" => Ok(EstimatorKind::Knn),
            other => Err(PipelineError::Config(format!(
                "unknown estimator '{}', expected 'ridge' or 'knn'",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EstimatorParams {
    Ridge(LinearParams),
    Knn(KnnParams),
}

/// A fitted estimator of either kind.
#[derive(Clone, Debug)]
pub enum FittedEstimator {
    Ridge(LinearModel),
    Knn(FittedKNeighborsRegressor),
}

impl FittedEstimator {
    pub fn kind(&self) -> EstimatorKind {
        match self {
            FittedEstimator::Ridge(_) => EstimatorKind::Ridge,
            FittedEstimator::Knn(_) => EstimatorKind::Knn,
        }
    }
}

impl From<LinearModel> for FittedEstimator {
    fn from(model: LinearModel) -> Self {
        FittedEstimator::Ridge(model)
    }
}

impl From<FittedKNeighborsRegressor> for FittedEstimator {
    fn from(model: FittedKNeighborsRegressor) -> Self {
        FittedEstimator::Knn(model)
    }
}

impl InferenceModel for FittedEstimator {
    type ParamsRepr = EstimatorParams;

    fn predict(&self, x: ArrayView1<f64>) -> Result<f64> {
        match self {
            FittedEstimator::Ridge(m) => m.predict(x),
            FittedEstimator::Knn(m) => m.predict(x),
        }
    }

    fn predict_batch(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            FittedEstimator::Ridge(m) => m.predict_batch(x),
            FittedEstimator::Knn(m) => m.predict_batch(x),
        }
    }

    fn n_features(&self) -> usize {
        match self {
            FittedEstimator::Ridge(m) => m.n_features(),
            FittedEstimator::Knn(m) => m.n_features(),
        }
    }

    fn extract_params(&self) -> EstimatorParams {
        match self {
            FittedEstimator::Ridge(m) => EstimatorParams::Ridge(m.extract_params()),
            FittedEstimator::Knn(m) => EstimatorParams::Knn(m.extract_params()),
        }
    }

    fn from_params(params: EstimatorParams) -> Result<Self> {
        Ok(match params {
            EstimatorParams::Ridge(p) => FittedEstimator::Ridge(LinearModel::from_params(p)?),
            EstimatorParams::Knn(p) => {
                FittedEstimator::Knn(FittedKNeighborsRegressor::from_params(p)?)
            }
        })
    }
}

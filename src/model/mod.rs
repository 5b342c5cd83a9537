//! Regression estimators over encoded feature matrices.
//!
//! Training and inference are separate types:
//! - [`TrainableModel`]: hyperparameters only; `fit` produces the fitted model.
//! - [`InferenceModel`]: learned parameters only, free of training settings;
//!   predicts and persists.
//!
//! Available estimators:
//! - [`RidgeRegression`] → [`LinearModel`]: closed-form L2-regularized least squares
//! - [`KNeighborsRegressor`] → [`FittedKNeighborsRegressor`]: distance-weighted k-NN
//!
//! [`FittedEstimator`] wraps either one behind a single persisted artifact.

pub mod estimator;
pub mod knn;
pub mod linear;

pub use estimator::{EstimatorKind, EstimatorParams, FittedEstimator};
pub use knn::{DistanceMetric, FittedKNeighborsRegressor, KNeighborsRegressor, KnnParams, Weights};
pub use linear::{LinearModel, LinearParams, RidgeRegression};

use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1};

use crate::error::{PipelineError, Result};
use crate::serialization::SerializableParams;

/// An estimator that can be fitted to a feature matrix and target vector.
pub trait TrainableModel {
    type Fitted: InferenceModel;

    /// # Errors
    /// Empty data, mismatched `x`/`y` lengths, or invalid hyperparameters.
    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Self::Fitted>;
}

/// A fitted estimator.
pub trait InferenceModel: Sized {
    type ParamsRepr: SerializableParams;

    /// Predict one sample.
    fn predict(&self, x: ArrayView1<f64>) -> Result<f64>;

    fn predict_batch(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        x.rows().into_iter().map(|row| self.predict(row)).collect()
    }

    /// Input width the model was fitted on.
    fn n_features(&self) -> usize;

    fn extract_params(&self) -> Self::ParamsRepr;

    fn from_params(params: Self::ParamsRepr) -> Result<Self>;

    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.extract_params().write_to(path)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_params(Self::ParamsRepr::read_from(path)?)
    }
}

pub(crate) fn check_training_data(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() == 0 {
        return Err(PipelineError::EmptyData(
            "cannot fit an estimator on zero samples".to_string(),
        ));
    }
    if x.nrows() != y.len() {
        return Err(PipelineError::InvalidParameter(format!(
            "{} samples but {} targets",
            x.nrows(),
            y.len()
        )));
    }
    Ok(())
}

pub(crate) fn check_width(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(PipelineError::FeatureMismatch {
            expected_features: expected,
            got_features: got,
        });
    }
    Ok(())
}

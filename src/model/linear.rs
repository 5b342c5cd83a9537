//! Linear regression with L2 regularization (ridge).
//!
//! [`RidgeRegression`] solves the regularized normal equations in closed form
//! on centered data, so the intercept is not penalized:
//!
//! ```text
//! (XcᵀXc + αI) w = Xcᵀyc,    b = ȳ − x̄·w
//! ```
//!
//! The fitted [`LinearModel`] keeps only `w` and `b`.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_training_data, check_width, InferenceModel, TrainableModel};
use crate::error::{PipelineError, Result};

/// Ridge regression hyperparameters.
#[derive(Clone, Debug)]
pub struct RidgeRegression {
    alpha: f64,
}

impl Default for RidgeRegression {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

impl RidgeRegression {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

/// Learned parameters of a linear model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearParams {
    pub weights: Vec<f64>,
    pub bias: f64,
}

/// Fitted linear model: `ŷ = w·x + b`.
#[derive(Clone, Debug)]
pub struct LinearModel {
    weights: Array1<f64>,
    bias: f64,
}

impl LinearModel {
    pub fn new(weights: Array1<f64>, bias: f64) -> Self {
        Self { weights, bias }
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }
}

impl TrainableModel for RidgeRegression {
    type Fitted = LinearModel;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<LinearModel> {
        check_training_data(x, y)?;
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(PipelineError::InvalidParameter(format!(
                "ridge alpha must be finite and non-negative, got {}",
                self.alpha
            )));
        }

        let x_mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| PipelineError::EmptyData("no samples".to_string()))?;
        let y_mean = y.mean().unwrap_or(0.0);
        let xc = x - &x_mean;
        let yc = y - y_mean;

        let mut gram = xc.t().dot(&xc);
        for i in 0..gram.nrows() {
            gram[[i, i]] += self.alpha;
        }
        let rhs = xc.t().dot(&yc);
        let weights = solve(gram, rhs)?;
        let bias = y_mean - x_mean.dot(&weights);

        debug!(
            features = weights.len(),
            samples = x.nrows(),
            alpha = self.alpha,
            "fitted ridge regression"
        );
        Ok(LinearModel::new(weights, bias))
    }
}

/// Solve `a · w = b` by Gaussian elimination with partial pivoting.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);
        if a[[pivot, col]].abs() < 1e-12 {
            return Err(PipelineError::InvalidParameter(
                "normal equations are singular; use a positive ridge alpha".to_string(),
            ));
        }
        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }
        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut w = Array1::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[[row, k]] * w[k]).sum();
        w[row] = (b[row] - tail) / a[[row, row]];
    }
    Ok(w)
}

impl InferenceModel for LinearModel {
    type ParamsRepr = LinearParams;

    fn predict(&self, x: ArrayView1<f64>) -> Result<f64> {
        check_width(self.weights.len(), x.len())?;
        Ok(self.weights.dot(&x) + self.bias)
    }

    fn predict_batch(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        check_width(self.weights.len(), x.ncols())?;
        Ok(x.dot(&self.weights) + self.bias)
    }

    fn n_features(&self) -> usize {
        self.weights.len()
    }

    fn extract_params(&self) -> LinearParams {
        LinearParams {
            weights: self.weights.to_vec(),
            bias: self.bias,
        }
    }

    fn from_params(params: LinearParams) -> Result<Self> {
        Ok(Self::new(Array1::from(params.weights), params.bias))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_solve_small_system() {
        let a = array![[2.0, 1.0], [1.0, 3.0]];
        let b = array![3.0, 5.0];
        let w = solve(a, b).unwrap();
        assert!((w[0] - 0.8).abs() < 1e-12);
        assert!((w[1] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_solve_needs_pivoting() {
        let a = array![[0.0, 1.0], [1.0, 0.0]];
        let b = array![2.0, 3.0];
        let w = solve(a, b).unwrap();
        assert_eq!(w.to_vec(), vec![3.0, 2.0]);
    }

    #[test]
    fn test_ridge_without_penalty_recovers_exact_fit() {
        // y = 2·x0 − 3·x1 + 5
        let x = array![[1.0, 0.0], [0.0, 1.0], [2.0, 1.0], [3.0, 5.0], [1.0, 1.0]];
        let y = x.map_axis(Axis(1), |r| 2.0 * r[0] - 3.0 * r[1] + 5.0);
        let model = RidgeRegression::new(0.0).fit(&x, &y).unwrap();
        assert!((model.weights()[0] - 2.0).abs() < 1e-9);
        assert!((model.weights()[1] + 3.0).abs() < 1e-9);
        assert!((model.bias() - 5.0).abs() < 1e-9);
        assert!((model.predict(array![4.0, 2.0].view()).unwrap() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_ridge_penalty_shrinks_weights() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];
        let plain = RidgeRegression::new(0.0).fit(&x, &y).unwrap();
        let ridge = RidgeRegression::new(10.0).fit(&x, &y).unwrap();
        assert!(ridge.weights()[0].abs() < plain.weights()[0].abs());
        // Intercept keeps predictions centered on the mean target.
        let mean_pred = ridge.predict(array![2.5].view()).unwrap();
        assert!((mean_pred - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_singular_system_without_penalty_fails() {
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
        let y = array![1.0, 2.0, 3.0];
        assert!(matches!(
            RidgeRegression::new(0.0).fit(&x, &y),
            Err(PipelineError::InvalidParameter(_))
        ));
        assert!(RidgeRegression::new(1.0).fit(&x, &y).is_ok());
    }

    #[test]
    fn test_invalid_inputs() {
        let x = array![[1.0], [2.0]];
        assert!(RidgeRegression::new(-1.0).fit(&x, &array![1.0, 2.0]).is_err());
        assert!(RidgeRegression::default().fit(&x, &array![1.0]).is_err());
        let empty = Array2::<f64>::zeros((0, 1));
        assert!(matches!(
            RidgeRegression::default().fit(&empty, &Array1::zeros(0)),
            Err(PipelineError::EmptyData(_))
        ));
    }

    #[test]
    fn test_predict_feature_mismatch() {
        let model = LinearModel::new(array![1.0, 2.0], 0.5);
        assert!(matches!(
            model.predict(array![1.0].view()),
            Err(PipelineError::FeatureMismatch { .. })
        ));
        let batch = model.predict_batch(&array![[1.0, 1.0], [0.0, 2.0]]).unwrap();
        assert_eq!(batch.to_vec(), vec![3.5, 4.5]);
    }

    #[test]
    fn test_linear_model_save_load() {
        let model = LinearModel::new(array![1.0, 2.0, 3.0], 0.5);
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("estimator.bin");
        model.save_to_file(&path).unwrap();
        let loaded = LinearModel::load_from_file(&path).unwrap();
        assert_eq!(loaded.extract_params(), model.extract_params());
    }
}

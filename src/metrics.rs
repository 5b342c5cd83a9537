//! Metrics for evaluating regression estimators.

use std::fmt;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Regression metrics over aligned truth and prediction vectors.
pub struct Metrics;

impl Metrics {
    /// Mean Squared Error: `mean((y_true - y_pred)^2)`. Lower is better.
    pub fn mse(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
        Self::mean_of(y_true, y_pred, |t, p| (t - p).powi(2))
    }

    /// Root Mean Squared Error, in the units of the target.
    pub fn rmse(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
        Ok(Self::mse(y_true, y_pred)?.sqrt())
    }

    /// Mean Absolute Error: `mean(|y_true - y_pred|)`.
    pub fn mae(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
        Self::mean_of(y_true, y_pred, |t, p| (t - p).abs())
    }

    /// Mean Absolute Percentage Error as a fraction (`0.1` is 10%).
    ///
    /// Zero targets are clamped to `f64::EPSILON` in the denominator.
    pub fn mape(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
        Self::mean_of(y_true, y_pred, |t, p| {
            (t - p).abs() / t.abs().max(f64::EPSILON)
        })
    }

    /// Coefficient of determination: `1 - SS_res / SS_tot`.
    ///
    /// Negative when the predictions are worse than the mean. A constant target
    /// scores 1.0 for a perfect prediction and 0.0 otherwise.
    pub fn r_squared(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
        Self::check(y_true, y_pred)?;
        let mean_true = y_true.mean().unwrap_or(0.0);
        let ss_res: f64 = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| (t - p).powi(2))
            .sum();
        let ss_tot: f64 = y_true.iter().map(|t| (t - mean_true).powi(2)).sum();

        if ss_tot == 0.0 {
            return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
        }
        Ok(1.0 - ss_res / ss_tot)
    }

    pub fn calculate_all(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<RegressionMetrics> {
        let mse = Self::mse(y_true, y_pred)?;
        Ok(RegressionMetrics {
            mae: Self::mae(y_true, y_pred)?,
            mse,
            rmse: mse.sqrt(),
            r_squared: Self::r_squared(y_true, y_pred)?,
            mape: Self::mape(y_true, y_pred)?,
        })
    }

    fn check(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<()> {
        if y_true.len() != y_pred.len() {
            return Err(PipelineError::FeatureMismatch {
                expected_features: y_true.len(),
                got_features: y_pred.len(),
            });
        }
        if y_true.is_empty() {
            return Err(PipelineError::EmptyData(
                "cannot score zero predictions".to_string(),
            ));
        }
        Ok(())
    }

    fn mean_of(
        y_true: &Array1<f64>,
        y_pred: &Array1<f64>,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<f64> {
        Self::check(y_true, y_pred)?;
        let sum: f64 = y_true.iter().zip(y_pred.iter()).map(|(&t, &p)| f(t, p)).sum();
        Ok(sum / y_true.len() as f64)
    }
}

/// All evaluation metrics of one estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    pub r_squared: f64,
    pub mape: f64,
}

impl fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MAE {:.2}  MSE {:.2}  RMSE {:.2}  R² {:.4}  MAPE {:.2}%",
            self.mae,
            self.mse,
            self.rmse,
            self.r_squared,
            self.mape * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mse_perfect() {
        let y = array![1.0, 2.0, 3.0, 4.0];
        assert_eq!(Metrics::mse(&y, &y).unwrap(), 0.0);
    }

    #[test]
    fn test_constant_offset() {
        let y_true = array![1.0, 2.0, 3.0, 4.0];
        let y_pred = array![2.0, 3.0, 4.0, 5.0];
        assert!((Metrics::mse(&y_true, &y_pred).unwrap() - 1.0).abs() < 1e-12);
        assert!((Metrics::mae(&y_true, &y_pred).unwrap() - 1.0).abs() < 1e-12);
        // (1 + 1/2 + 1/3 + 1/4) / 4
        let mape = Metrics::mape(&y_true, &y_pred).unwrap();
        assert!((mape - 25.0 / 48.0).abs() < 1e-12);
    }

    #[test]
    fn test_r_squared() {
        let y_true = array![1.0, 2.0, 3.0, 4.0];
        assert_eq!(Metrics::r_squared(&y_true, &y_true).unwrap(), 1.0);
        let mean = array![2.5, 2.5, 2.5, 2.5];
        assert_eq!(Metrics::r_squared(&y_true, &mean).unwrap(), 0.0);

        let constant = array![2.0, 2.0];
        assert_eq!(Metrics::r_squared(&constant, &constant).unwrap(), 1.0);
        assert_eq!(Metrics::r_squared(&constant, &array![1.0, 3.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_calculate_all() {
        let y_true = array![100.0, 200.0];
        let y_pred = array![110.0, 180.0];
        let m = Metrics::calculate_all(&y_true, &y_pred).unwrap();
        assert_eq!(m.mae, 15.0);
        assert_eq!(m.mse, 250.0);
        assert!((m.rmse - 250.0_f64.sqrt()).abs() < 1e-12);
        assert!((m.mape - 0.1).abs() < 1e-12);
        assert!(m.to_string().starts_with("MAE 15.00"));
    }

    #[test]
    fn test_length_mismatch_and_empty() {
        assert!(Metrics::mae(&array![1.0], &array![1.0, 2.0]).is_err());
        assert!(matches!(
            Metrics::mse(&Array1::zeros(0), &Array1::zeros(0)),
            Err(PipelineError::EmptyData(_))
        ));
    }
}

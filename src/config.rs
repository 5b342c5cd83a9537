//! Pipeline configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::features::RoomSizePolicy;
use crate::model::EstimatorKind;
use crate::preprocessing::DEFAULT_CARDINALITY_THRESHOLD;

/// File name of the persisted feature encoder inside the artifact directory.
pub const PREPROCESSOR_FILE: &str = "preprocessor.bin";
/// File name of the persisted estimator inside the artifact directory.
pub const ESTIMATOR_FILE: &str = "estimator.bin";

/// Settings for training and serving.
///
/// Every field has a default, so a JSON file only needs the fields it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Text columns with at most this many distinct values are one-hot encoded.
    pub cardinality_threshold: usize,
    /// Share of rows held out for evaluation.
    pub test_size: f64,
    pub seed: u64,
    /// Drop rows without a price before imputing.
    pub drop_missing_target: bool,
    pub room_size_zero_policy: RoomSizePolicy,
    pub ridge_alpha: f64,
    pub knn_neighbors: usize,
    /// Estimators fitted and evaluated during training.
    pub estimators: Vec<EstimatorKind>,
    /// Estimator persisted for serving. Always fitted, even when not listed.
    pub selected_estimator: EstimatorKind,
    pub artifact_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cardinality_threshold: DEFAULT_CARDINALITY_THRESHOLD,
            test_size: 0.2,
            seed: 42,
            drop_missing_target: true,
            room_size_zero_policy: RoomSizePolicy::default(),
            ridge_alpha: 1.0,
            knn_neighbors: 9,
            estimators: vec![EstimatorKind::Ridge, EstimatorKind::Knn],
            selected_estimator: EstimatorKind::Ridge,
            artifact_dir: PathBuf::from("artifacts"),
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config file and validate it.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PipelineError::Config(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if !self.ridge_alpha.is_finite() || self.ridge_alpha < 0.0 {
            return Err(PipelineError::Config(format!(
                "ridge_alpha must be finite and non-negative, got {}",
                self.ridge_alpha
            )));
        }
        if self.knn_neighbors == 0 {
            return Err(PipelineError::Config(
                "knn_neighbors must be at least 1".to_string(),
            ));
        }
        if let RoomSizePolicy::Substitute(v) = self.room_size_zero_policy {
            if !v.is_finite() {
                return Err(PipelineError::Config(format!(
                    "room size substitute must be finite, got {}",
                    v
                )));
            }
        }
        Ok(())
    }

    /// Estimators to fit: the configured list plus the selected one, without repeats.
    pub fn estimators_to_fit(&self) -> Vec<EstimatorKind> {
        let mut kinds = self.estimators.clone();
        kinds.push(self.selected_estimator);
        let mut seen = Vec::with_capacity(kinds.len());
        kinds.retain(|k| {
            let fresh = !seen.contains(k);
            seen.push(*k);
            fresh
        });
        kinds
    }

    pub fn preprocessor_path(&self) -> PathBuf {
        self.artifact_dir.join(PREPROCESSOR_FILE)
    }

    pub fn estimator_path(&self) -> PathBuf {
        self.artifact_dir.join(ESTIMATOR_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.cardinality_threshold, 10);
        assert_eq!(config.seed, 42);
        assert_eq!(config.room_size_zero_policy, RoomSizePolicy::Substitute(1.0));
        assert_eq!(config.preprocessor_path(), PathBuf::from("artifacts/preprocessor.bin"));
        assert_eq!(config.estimator_path(), PathBuf::from("artifacts/estimator.bin"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"seed": 7, "selected_estimator": "knn", "room_size_zero_policy": "Missing"}"#,
        )
        .unwrap();
        let config = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.selected_estimator, EstimatorKind::Knn);
        assert_eq!(config.room_size_zero_policy, RoomSizePolicy::Missing);
        assert_eq!(config.test_size, 0.2);
    }

    #[test]
    fn test_invalid_json_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"test_size": 1.5}"#).unwrap();
        assert!(matches!(
            PipelineConfig::from_json_file(&path),
            Err(PipelineError::Config(_))
        ));
        fs::write(&path, r#"{"learning_rate": 0.1}"#).unwrap();
        assert!(matches!(
            PipelineConfig::from_json_file(&path),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_estimators_to_fit_includes_selected() {
        let config = PipelineConfig {
            estimators: vec![EstimatorKind::Knn, EstimatorKind::Knn],
            selected_estimator: EstimatorKind::Ridge,
            ..PipelineConfig::default()
        };
        assert_eq!(
            config.estimators_to_fit(),
            vec![EstimatorKind::Knn, EstimatorKind::Ridge]
        );
    }
}

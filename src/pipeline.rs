//! Training orchestration.
//!
//! ```text
//! raw CSV → clean → engineer → split → fit encoder (train) → fit estimators
//!         → evaluate (test) → persist encoder + selected estimator
//! ```

use std::fs;
use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cleaning::{clean_table, format_table, normalize_schema, NullEstimator};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::features::{engineer_table, FeatureDeriver, TARGET_COLUMN};
use crate::metrics::{Metrics, RegressionMetrics};
use crate::model::{
    EstimatorKind, FittedEstimator, InferenceModel, KNeighborsRegressor, RidgeRegression,
    TrainableModel,
};
use crate::preprocessing::{FeatureEncoder, FittedFeatureEncoder, FittedTransformer, Transformer};
use crate::split::train_test_split;
use crate::table::csv_io::{read_table, write_table};
use crate::table::Table;

/// Test-set metrics of one fitted estimator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub estimator: EstimatorKind,
    pub metrics: RegressionMetrics,
}

/// Summary of a training run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub feature_names: Vec<String>,
    pub evaluations: Vec<Evaluation>,
    pub selected: EstimatorKind,
}

/// Fitted artifacts of a training run, before persistence.
#[derive(Clone, Debug)]
pub struct TrainedArtifacts {
    pub encoder: FittedFeatureEncoder,
    pub estimator: FittedEstimator,
    pub report: TrainingReport,
}

impl TrainedArtifacts {
    /// Write the encoder and estimator into `config.artifact_dir`.
    pub fn save(&self, config: &PipelineConfig) -> Result<()> {
        fs::create_dir_all(&config.artifact_dir)?;
        self.encoder.save_to_file(config.preprocessor_path())?;
        self.estimator.save_to_file(config.estimator_path())?;
        info!(
            dir = %config.artifact_dir.display(),
            estimator = %self.estimator.kind(),
            "saved artifacts"
        );
        Ok(())
    }
}

/// Runs the cleaning, engineering and training stages with one configuration.
#[derive(Clone, Debug, Default)]
pub struct TrainingPipeline {
    config: PipelineConfig,
}

impl TrainingPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn null_estimator(&self) -> NullEstimator {
        NullEstimator::new(TARGET_COLUMN).with_drop_missing_target(self.config.drop_missing_target)
    }

    pub fn deriver(&self) -> FeatureDeriver {
        FeatureDeriver::new(self.config.room_size_zero_policy)
    }

    /// Raw table → cleaned table.
    pub fn clean(&self, raw: Table) -> Result<Table> {
        clean_table(raw, &self.null_estimator())
    }

    /// Cleaned table → canonical feature table.
    pub fn engineer(&self, cleaned: Table) -> Result<Table> {
        engineer_table(cleaned, &self.deriver())
    }

    /// Fit the encoder and every configured estimator on a canonical feature table.
    pub fn fit(&self, features: &Table) -> Result<TrainedArtifacts> {
        let (train, test) = train_test_split(features, self.config.test_size, self.config.seed)?;
        info!(train = train.n_rows(), test = test.n_rows(), "split rows");

        let encoder = FeatureEncoder::new()
            .with_cardinality_threshold(self.config.cardinality_threshold)
            .fit(&train)?;
        let x_train = encoder.transform(&train)?;
        let y_train = target_vector(&train)?;
        let x_test = encoder.transform(&test)?;
        let y_test = target_vector(&test)?;

        let mut evaluations = Vec::new();
        let mut selected = None;
        for kind in self.config.estimators_to_fit() {
            let estimator = self.fit_estimator(kind, &x_train, &y_train)?;
            let metrics = Metrics::calculate_all(&y_test, &estimator.predict_batch(&x_test)?)?;
            info!(
                estimator = %kind,
                mae = metrics.mae,
                rmse = metrics.rmse,
                r2 = metrics.r_squared,
                mape = metrics.mape,
                "evaluated estimator"
            );
            evaluations.push(Evaluation {
                estimator: kind,
                metrics,
            });
            if kind == self.config.selected_estimator {
                selected = Some(estimator);
            }
        }
        let estimator = selected.ok_or_else(|| {
            PipelineError::Config(format!(
                "selected estimator '{}' was not fitted",
                self.config.selected_estimator
            ))
        })?;

        let report = TrainingReport {
            rows: features.n_rows(),
            train_rows: train.n_rows(),
            test_rows: test.n_rows(),
            feature_names: encoder.feature_names_out(),
            evaluations,
            selected: estimator.kind(),
        };
        Ok(TrainedArtifacts {
            encoder,
            estimator,
            report,
        })
    }

    /// Clean, engineer and fit a raw table.
    pub fn train(&self, raw: Table) -> Result<TrainedArtifacts> {
        let features = self.engineer(self.clean(raw)?)?;
        self.fit(&features)
    }

    /// Train from a raw CSV file and persist the artifacts.
    pub fn run<P: AsRef<Path>>(&self, input: P) -> Result<TrainingReport> {
        let artifacts = self.train(read_table(input)?)?;
        artifacts.save(&self.config)?;
        Ok(artifacts.report)
    }

    /// Read a raw CSV, clean it and write the cleaned table.
    pub fn clean_file<P: AsRef<Path>, Q: AsRef<Path>>(&self, input: P, output: Q) -> Result<Table> {
        let cleaned = self.clean(read_table(input)?)?;
        write_table(&cleaned, output)?;
        Ok(cleaned)
    }

    /// Read a cleaned CSV, engineer it and write the feature table.
    ///
    /// CSV cells carry no types, so the schema and formatting stages run again
    /// first. Both leave already-cleaned values unchanged.
    pub fn engineer_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<Table> {
        let cleaned = format_table(normalize_schema(read_table(input)?))?;
        let engineered = self.engineer(cleaned)?;
        write_table(&engineered, output)?;
        Ok(engineered)
    }

    fn fit_estimator(
        &self,
        kind: EstimatorKind,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<FittedEstimator> {
        Ok(match kind {
            EstimatorKind::Ridge => RidgeRegression::new(self.config.ridge_alpha).fit(x, y)?.into(),
            EstimatorKind::Knn => KNeighborsRegressor::new(self.config.knn_neighbors)
                .fit(x, y)?
                .into(),
        })
    }
}

/// The price column as a target vector.
pub fn target_vector(table: &Table) -> Result<Array1<f64>> {
    let data = table.require(TARGET_COLUMN)?.data();
    (0..data.len())
        .map(|row| {
            data.get(row).as_f64().ok_or_else(|| {
                PipelineError::InvalidParameter(format!(
                    "row {} has no numeric {} value",
                    row, TARGET_COLUMN
                ))
            })
        })
        .collect()
}

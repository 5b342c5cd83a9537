//! Error types for the cleaning, encoding, training and serving stages.
//!
//! Arithmetic problems (zero divisors in derived ratios) and schema problems at
//! inference time (unseen categories, absent columns) never surface here: they
//! are resolved by explicit substitution policies where they occur.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error type for every fallible pipeline operation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A sale-date string matched none of the accepted formats.
    #[error("cannot parse sale date '{value}'")]
    DateParse { value: String },
    /// A column the operation depends on is absent.
    #[error("missing column '{0}'")]
    MissingColumn(String),
    /// A column holds a different value type than the operation needs.
    #[error("column '{column}' must be {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
    },
    /// Columns of a table disagree on row count.
    #[error("column '{column}' has {got} rows, table has {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        got: usize,
    },
    /// Empty data provided where non-empty was required.
    #[error("empty data: {0}")]
    EmptyData(String),
    /// Invalid hyperparameter or argument value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// Feature dimension mismatch.
    #[error("feature mismatch: expected {expected_features} features, got {got_features}")]
    FeatureMismatch {
        expected_features: usize,
        got_features: usize,
    },
    /// A prediction was requested before the serving artifacts were loaded.
    #[error("prediction requested before the feature encoder and estimator were loaded")]
    NotLoaded,
    /// A persisted artifact is absent or unreadable.
    #[error("failed to load {artifact} from {}: {reason}", path.display())]
    Artifact {
        artifact: &'static str,
        path: PathBuf,
        reason: String,
    },
    /// The persisted encoder and estimator do not fit together.
    #[error("incompatible artifacts: encoder emits {encoder_features} features, estimator expects {estimator_features}")]
    IncompatibleArtifacts {
        encoder_features: usize,
        estimator_features: usize,
    },
    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Invalid configuration file or value.
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<bincode::Error> for PipelineError {
    fn from(err: bincode::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Config(err.to_string())
    }
}

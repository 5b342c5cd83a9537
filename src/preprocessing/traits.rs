//! Core traits for feature transformers.
//!
//! - [`Transformer`]: configured but unfitted; learns from a training table.
//! - [`FittedTransformer`]: fitted; maps tables to numeric matrices and can
//!   be persisted.
//!
//! Transformers address their input columns by name. A fitted transformer
//! reads exactly the columns it was fitted on, wherever they sit in the
//! incoming table, and treats an absent column as entirely missing.

use std::path::Path;

use ndarray::Array2;

use crate::error::Result;
use crate::serialization::SerializableParams;
use crate::table::Table;

/// Unfitted transformer with hyperparameters.
pub trait Transformer: Clone {
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;
    /// The fitted transformer type ready for inference.
    type Fitted: FittedTransformer<Params = Self::Params>;

    /// Learn parameters from every column of `data`.
    ///
    /// # Errors
    /// Empty data, or a column whose type the transformer cannot handle.
    fn fit(&self, data: &Table) -> Result<Self::Fitted>;

    fn fit_transform(&self, data: &Table) -> Result<Array2<f64>> {
        self.fit(data)?.transform(data)
    }
}

/// Fitted transformer ready for inference.
///
/// `extract_params` followed by `from_params` reproduces the transformer, and
/// the bytes written by `save_to_file` do not change across a reload.
pub trait FittedTransformer: Clone + Sized {
    type Params: SerializableParams;

    /// Encode `data` into one row of features per input row.
    fn transform(&self, data: &Table) -> Result<Array2<f64>>;

    /// Output feature names, in column order of [`FittedTransformer::transform`].
    fn feature_names_out(&self) -> Vec<String>;

    /// Names of the input columns seen during fit.
    fn input_columns(&self) -> &[String];

    fn n_features_in(&self) -> usize {
        self.input_columns().len()
    }

    fn n_features_out(&self) -> usize {
        self.feature_names_out().len()
    }

    fn extract_params(&self) -> Self::Params;

    fn from_params(params: Self::Params) -> Result<Self>;

    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.extract_params().write_to(path)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_params(Self::Params::read_from(path)?)
    }
}

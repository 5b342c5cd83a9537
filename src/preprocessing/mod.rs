//! Feature encoding: from canonical feature tables to numeric matrices.
//!
//! Transformers follow a fit-then-freeze pattern:
//!
//! - [`Transformer`]: unfitted, configured with hyperparameters
//! - [`FittedTransformer`]: fitted, immutable, persisted through its params
//!
//! # Available Transformers
//!
//! | Transformer | Description |
//! |-------------|-------------|
//! | [`StandardScaler`] | Z-score normalization of numeric columns |
//! | [`OneHotEncoder`] | Indicator features for text columns |
//! | [`OrdinalEncoder`] | Sorted-category index for text columns |
//! | [`FeatureEncoder`] | All three, split by column type and cardinality |
//!
//! # Example
//!
//! ```ignore
//! use property_price::preprocessing::{FeatureEncoder, FittedTransformer, Transformer};
//!
//! let fitted = FeatureEncoder::new().fit(&train)?;
//! fitted.save_to_file("artifacts/preprocessor.bin")?;
//!
//! let loaded = FittedFeatureEncoder::load_from_file("artifacts/preprocessor.bin")?;
//! let x = loaded.transform(&test)?;
//! ```

mod cells;
pub mod column_transformer;
pub mod encoding;
pub mod scaling;
pub mod traits;

pub use column_transformer::{
    FeatureEncoder, FeatureEncoderParams, FittedFeatureEncoder, DEFAULT_CARDINALITY_THRESHOLD,
};
pub use encoding::{
    FittedOneHotEncoder, FittedOrdinalEncoder, HandleUnknown, OneHotEncoder, OrdinalEncoder,
};
pub use scaling::{FittedStandardScaler, StandardScaler};
pub use traits::{FittedTransformer, Transformer};

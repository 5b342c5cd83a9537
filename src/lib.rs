//! # property-price
//!
//! Feature engineering, encoding and single-record inference for residential
//! property sale prices.
//!
//! ## Core Design Principles
//!
//! - **One derivation path**: batch training data and single submitted records
//!   go through the same formatting and derivation functions. A record is a
//!   one-row table.
//! - **Frozen formatting**: text normalization replaces a fixed, versioned set
//!   of separator characters, so a record formats the same way on its own as
//!   inside a batch.
//! - **Name-addressed encoding**: the fitted encoder reads columns by name and
//!   treats absent columns and unseen categories as unknown.
//! - **Training/Inference Separation**: fitted encoders and estimators carry
//!   only learned parameters and persist byte-stably.
//!
//! ## Quick Start
//!
//! ```ignore
//! use property_price::config::PipelineConfig;
//! use property_price::pipeline::TrainingPipeline;
//! use property_price::serving::{PropertyInput, ServingContext};
//!
//! let config = PipelineConfig::default();
//! let report = TrainingPipeline::new(config.clone()).run("melbourne.csv")?;
//!
//! let context = ServingContext::from_config(&config)?;
//! let price = context.predict(&PropertyInput {
//!     suburb: Some("Kew".into()),
//!     sale_date: Some("2017-03-15".into()),
//!     rooms: Some(3),
//!     ..Default::default()
//! })?;
//! ```
//!
//! ## Module Structure
//!
//! - `table`: Typed columns, tables, records and CSV I/O
//! - `cleaning`: Schema normalizer, cell formatter, null estimator, deduplicator
//! - `features`: Feature deriver, street types, canonical column order
//! - `preprocessing`: Scaler, one-hot and ordinal encoders, the feature encoder
//! - `model`: Ridge regression and k-nearest-neighbours estimators
//! - `metrics`: Regression evaluation metrics
//! - `split`: Seeded train/test split
//! - `pipeline`: Training orchestration and artifact persistence
//! - `serving`: Serving context and load-once inference adapter
//! - `config`: Pipeline configuration
//! - `serialization`: Byte persistence of fitted parameters

/// Cleaning stages from raw sale records to cleaned records.
pub mod cleaning;

/// Pipeline configuration.
pub mod config;

/// Error taxonomy shared by every stage.
pub mod error;

/// Derived features and canonical column order.
pub mod features;

/// Regression evaluation metrics.
pub mod metrics;

/// Regression estimators with separate training and inference types.
pub mod model;

/// Training orchestration.
pub mod pipeline;

/// Feature encoders for canonical feature tables.
pub mod preprocessing;

/// Byte persistence of fitted parameters.
pub mod serialization;

/// Single-record inference.
pub mod serving;

/// Seeded train/test split.
pub mod split;

/// Column-typed tables and CSV I/O.
pub mod table;

pub use error::{PipelineError, Result};

//! Single-record inference.
//!
//! A [`ServingContext`] owns the fitted feature encoder and estimator and is
//! immutable once built; prediction takes `&self`, so any number of threads
//! may share one context. A record goes through the same batch functions as
//! training data, lifted into a one-row table:
//!
//! ```text
//! PropertyInput → Record → format_table → engineer_table → encoder → estimator
//! ```
//!
//! [`InferenceAdapter`] adds the load-once lifecycle for callers that hold a
//! long-lived handle: `Unloaded → Loaded → Serving`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cleaning::format_table;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::features::{reorder_columns, FeatureDeriver};
use crate::model::{FittedEstimator, InferenceModel};
use crate::preprocessing::{FittedFeatureEncoder, FittedTransformer};
use crate::table::{Record, Table};

const ENCODER_ARTIFACT: &str = "feature encoder";
const ESTIMATOR_ARTIFACT: &str = "estimator";

/// One property as entered for a price estimate.
///
/// Field names match the domain column names. Omitted fields are treated as
/// missing and resolved by the encoder's fallbacks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PropertyInput {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Any accepted sale-date format, e.g. `2017-03-15` or `15/03/2017`.
    pub sale_date: Option<String>,
    pub year_built: Option<i64>,
    pub region_name: Option<String>,
    pub suburb: Option<String>,
    pub council_area: Option<String>,
    #[serde(rename = "DistanceToCBD")]
    pub distance_to_cbd: Option<f64>,
    pub postcode: Option<i64>,
    pub neighbouring_properties: Option<i64>,
    pub real_estate_agent: Option<String>,
    pub land_size: Option<i64>,
    pub building_area: Option<f64>,
    pub rooms: Option<i64>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub car_spots: Option<i64>,
}

impl PropertyInput {
    pub fn to_record(&self) -> Record {
        Record::new()
            .with("Latitude", self.latitude)
            .with("Longitude", self.longitude)
            .with("SaleDate", self.sale_date.clone())
            .with("YearBuilt", self.year_built)
            .with("RegionName", self.region_name.clone())
            .with("Suburb", self.suburb.clone())
            .with("CouncilArea", self.council_area.clone())
            .with("DistanceToCBD", self.distance_to_cbd)
            .with("Postcode", self.postcode)
            .with("NeighbouringProperties", self.neighbouring_properties)
            .with("RealEstateAgent", self.real_estate_agent.clone())
            .with("LandSize", self.land_size)
            .with("BuildingArea", self.building_area)
            .with("Rooms", self.rooms)
            .with("Bedrooms", self.bedrooms)
            .with("Bathrooms", self.bathrooms)
            .with("CarSpots", self.car_spots)
    }

    /// A fully populated input, used to learn which columns the serving path produces.
    fn template() -> Self {
        Self {
            latitude: Some(0.0),
            longitude: Some(0.0),
            sale_date: Some("2017-01-01".to_string()),
            year_built: Some(2000),
            region_name: Some("Region".to_string()),
            suburb: Some("Suburb".to_string()),
            council_area: Some("Council".to_string()),
            distance_to_cbd: Some(1.0),
            postcode: Some(3000),
            neighbouring_properties: Some(1),
            real_estate_agent: Some("Agent".to_string()),
            land_size: Some(1),
            building_area: Some(1.0),
            rooms: Some(1),
            bedrooms: Some(1),
            bathrooms: Some(1),
            car_spots: Some(1),
        }
    }
}

/// Fitted artifacts shared by every prediction.
#[derive(Clone, Debug)]
pub struct ServingContext {
    encoder: FittedFeatureEncoder,
    estimator: FittedEstimator,
    deriver: FeatureDeriver,
}

impl ServingContext {
    /// # Errors
    /// [`PipelineError::IncompatibleArtifacts`] when the estimator was not
    /// fitted on this encoder's output width.
    pub fn new(
        encoder: FittedFeatureEncoder,
        estimator: FittedEstimator,
        deriver: FeatureDeriver,
    ) -> Result<Self> {
        if encoder.n_features_out() != estimator.n_features() {
            return Err(PipelineError::IncompatibleArtifacts {
                encoder_features: encoder.n_features_out(),
                estimator_features: estimator.n_features(),
            });
        }
        let context = Self {
            encoder,
            estimator,
            deriver,
        };
        let unsupplied = context.unsupplied_columns()?;
        if !unsupplied.is_empty() {
            warn!(
                columns = ?unsupplied,
                "encoder columns the property input cannot supply; they encode as unknown"
            );
        }
        Ok(context)
    }

    /// Load both artifacts from explicit paths.
    ///
    /// # Errors
    /// [`PipelineError::Artifact`] naming the artifact that is absent or
    /// unreadable, or [`PipelineError::IncompatibleArtifacts`].
    pub fn load(
        encoder_path: impl AsRef<Path>,
        estimator_path: impl AsRef<Path>,
        deriver: FeatureDeriver,
    ) -> Result<Self> {
        let encoder = load_artifact(ENCODER_ARTIFACT, encoder_path.as_ref(), |p| {
            FittedFeatureEncoder::load_from_file(p)
        })?;
        let estimator = load_artifact(ESTIMATOR_ARTIFACT, estimator_path.as_ref(), |p| {
            FittedEstimator::load_from_file(p)
        })?;
        info!(
            features = encoder.n_features_out(),
            estimator = %estimator.kind(),
            "loaded serving artifacts"
        );
        Self::new(encoder, estimator, deriver)
    }

    /// Load from the artifact directory of a config.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::load(
            config.preprocessor_path(),
            config.estimator_path(),
            FeatureDeriver::new(config.room_size_zero_policy),
        )
    }

    pub fn encoder(&self) -> &FittedFeatureEncoder {
        &self.encoder
    }

    pub fn estimator(&self) -> &FittedEstimator {
        &self.estimator
    }

    /// Canonical feature table of one record.
    pub fn features(&self, record: &Record) -> Result<Table> {
        feature_table(std::slice::from_ref(record), &self.deriver)
    }

    pub fn predict_record(&self, record: &Record) -> Result<f64> {
        let x = self.encoder.transform(&self.features(record)?)?;
        let price = self.estimator.predict(x.row(0))?;
        debug!(price, "predicted price");
        Ok(price)
    }

    /// # Errors
    /// [`PipelineError::DateParse`] for a malformed sale date. Unknown
    /// categories and omitted fields never fail.
    pub fn predict(&self, input: &PropertyInput) -> Result<f64> {
        self.predict_record(&input.to_record())
    }

    pub fn predict_many(&self, inputs: &[PropertyInput]) -> Result<Array1<f64>> {
        inputs.iter().map(|input| self.predict(input)).collect()
    }

    /// Encoder input columns that no [`PropertyInput`] can fill.
    pub fn unsupplied_columns(&self) -> Result<Vec<String>> {
        let produced = self.features(&PropertyInput::template().to_record())?;
        let produced: BTreeSet<&str> = produced.column_names().into_iter().collect();
        Ok(self
            .encoder
            .input_columns()
            .iter()
            .filter(|c| !produced.contains(c.as_str()))
            .cloned()
            .collect())
    }
}

/// Format, derive and reorder records with the same functions the training
/// path runs over whole tables.
pub fn feature_table(records: &[Record], deriver: &FeatureDeriver) -> Result<Table> {
    let table = format_table(Table::from_records(records)?)?;
    Ok(reorder_columns(deriver.engineer(table)?))
}

fn load_artifact<T>(
    artifact: &'static str,
    path: &Path,
    load: impl FnOnce(&Path) -> Result<T>,
) -> Result<T> {
    let fail = |reason: String| PipelineError::Artifact {
        artifact,
        path: PathBuf::from(path),
        reason,
    };
    if !path.is_file() {
        return Err(fail("file not found".to_string()));
    }
    load(path).map_err(|e| fail(e.to_string()))
}

/// Lifecycle of an [`InferenceAdapter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum AdapterState {
    Unloaded = 0,
    Loaded = 1,
    Serving = 2,
}

impl AdapterState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => AdapterState::Unloaded,
            1 => AdapterState::Loaded,
            _ => AdapterState::Serving,
        }
    }
}

/// Load-once holder of a [`ServingContext`].
///
/// Concurrent `load` calls run at most one load; the others wait and receive
/// the same context. A failed load leaves the adapter unloaded.
#[derive(Debug, Default)]
pub struct InferenceAdapter {
    context: OnceLock<ServingContext>,
    load_guard: Mutex<()>,
    state: AtomicU8,
}

impl InferenceAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AdapterState {
        AdapterState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Load with `loader` unless a context is already present.
    pub fn load_with(
        &self,
        loader: impl FnOnce() -> Result<ServingContext>,
    ) -> Result<&ServingContext> {
        if let Some(context) = self.context.get() {
            return Ok(context);
        }
        let _guard = self.load_guard.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(context) = self.context.get() {
            return Ok(context);
        }
        let loaded = loader()?;
        let context = self.context.get_or_init(|| loaded);
        self.state.store(AdapterState::Loaded as u8, Ordering::Release);
        Ok(context)
    }

    pub fn load(&self, config: &PipelineConfig) -> Result<&ServingContext> {
        self.load_with(|| ServingContext::from_config(config))
    }

    /// # Errors
    /// [`PipelineError::NotLoaded`] before a successful load.
    pub fn predict(&self, input: &PropertyInput) -> Result<f64> {
        let context = self.context.get().ok_or(PipelineError::NotLoaded)?;
        let _ = self.state.compare_exchange(
            AdapterState::Loaded as u8,
            AdapterState::Serving as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        context.predict(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RidgeRegression, TrainableModel};
    use crate::pipeline::target_vector;
    use crate::preprocessing::{FeatureEncoder, Transformer};
    use std::sync::atomic::AtomicUsize;

    const SUBURBS: [&str; 3] = ["Kew", "Carlton", "Richmond"];

    fn input(i: usize) -> PropertyInput {
        PropertyInput {
            latitude: Some(-37.8 + i as f64 * 0.001),
            longitude: Some(144.9 + i as f64 * 0.001),
            sale_date: Some(format!("{}/0{}/2017", 10 + i % 15, 1 + i % 9)),
            year_built: Some(1950 + i as i64),
            region_name: Some("Southern Metropolitan".to_string()),
            suburb: Some(SUBURBS[i % 3].to_string()),
            council_area: Some("Boroondara City Council".to_string()),
            distance_to_cbd: Some(2.0 + i as f64 / 2.0),
            postcode: Some(3101),
            neighbouring_properties: Some(5000 + i as i64),
            real_estate_agent: Some(format!("Agent {}", i % 4)),
            land_size: Some(if i == 0 { 0 } else { 100 + 25 * i as i64 }),
            building_area: Some(60.0 + 10.0 * i as f64),
            rooms: Some(1 + (i % 4) as i64),
            bedrooms: Some(1 + (i % 3) as i64),
            bathrooms: Some(1),
            car_spots: Some((i % 2) as i64),
        }
    }

    fn training_records() -> Vec<Record> {
        (0..24)
            .map(|i| {
                input(i)
                    .to_record()
                    .with("Address", format!("{} Example St", i + 1))
                    .with("UnitType", "h")
                    .with("Price", 400_000.0 + 150_000.0 * (1 + i % 4) as f64 + 1_000.0 * i as f64)
            })
            .collect()
    }

    fn fitted_context() -> (ServingContext, Table) {
        let deriver = FeatureDeriver::default();
        let features = feature_table(&training_records(), &deriver).unwrap();
        let encoder = FeatureEncoder::new().fit(&features).unwrap();
        let x = encoder.transform(&features).unwrap();
        let y = target_vector(&features).unwrap();
        let estimator = RidgeRegression::new(1.0).fit(&x, &y).unwrap().into();
        (ServingContext::new(encoder, estimator, deriver).unwrap(), features)
    }

    #[test]
    fn test_single_record_matches_batch_prediction() {
        let (context, features) = fitted_context();
        // A property input carries no address or unit type, so compare with a
        // batch that lacks those columns as well.
        let mut reduced = features.clone();
        for name in context.unsupplied_columns().unwrap() {
            reduced.remove_column(&name);
        }
        let batch = context
            .estimator()
            .predict_batch(&context.encoder().transform(&reduced).unwrap())
            .unwrap();
        for (i, expected) in batch.iter().enumerate() {
            let single = context.predict(&input(i)).unwrap();
            assert!((single - expected).abs() <= 1e-9 * expected.abs());
        }
        assert_eq!(
            context.predict_many(&[input(0), input(5)]).unwrap().len(),
            2
        );
    }

    #[test]
    fn test_unsupplied_columns() {
        let (context, _) = fitted_context();
        assert_eq!(
            context.unsupplied_columns().unwrap(),
            vec!["StreetName", "StreetType", "UnitType"]
        );
    }

    #[test]
    fn test_unseen_category_and_missing_fields_do_not_fail() {
        let (context, _) = fitted_context();
        let mut unseen = input(3);
        unseen.suburb = Some("Brand New Suburb".to_string());
        unseen.real_estate_agent = None;
        unseen.building_area = None;
        assert!(context.predict(&unseen).unwrap().is_finite());
        assert!(context.predict(&PropertyInput::default()).unwrap().is_finite());
    }

    #[test]
    fn test_untrimmed_council_encodes_like_training() {
        let (context, features) = fitted_context();
        assert_eq!(features.value(0, "CouncilArea").as_str(), Some("Boroondara_City"));

        let mut padded = input(2);
        padded.council_area = Some("  Boroondara City Council ".to_string());
        let padded_features = context.features(&padded.to_record()).unwrap();
        assert_eq!(
            padded_features.value(0, "CouncilArea").as_str(),
            Some("Boroondara_City")
        );
        assert_eq!(
            context.predict(&padded).unwrap(),
            context.predict(&input(2)).unwrap()
        );
    }

    #[test]
    fn test_malformed_date_is_rejected() {
        let (context, _) = fitted_context();
        let mut bad = input(1);
        bad.sale_date = Some("next tuesday".to_string());
        assert!(matches!(
            context.predict(&bad),
            Err(PipelineError::DateParse { .. })
        ));
    }

    #[test]
    fn test_incompatible_artifacts() {
        let (context, _) = fitted_context();
        let x = ndarray::array![[1.0, 2.0], [2.0, 1.0], [3.0, 3.0]];
        let y = ndarray::array![1.0, 2.0, 3.0];
        let narrow = RidgeRegression::new(1.0).fit(&x, &y).unwrap().into();
        let err =
            ServingContext::new(context.encoder().clone(), narrow, FeatureDeriver::default())
                .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::IncompatibleArtifacts {
                estimator_features: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_load_names_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServingContext::load(
            dir.path().join("preprocessor.bin"),
            dir.path().join("estimator.bin"),
            FeatureDeriver::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Artifact {
                artifact: "feature encoder",
                ..
            }
        ));

        let (context, _) = fitted_context();
        context.encoder().save_to_file(dir.path().join("preprocessor.bin")).unwrap();
        std::fs::write(dir.path().join("estimator.bin"), b"not an estimator").unwrap();
        let err = ServingContext::load(
            dir.path().join("preprocessor.bin"),
            dir.path().join("estimator.bin"),
            FeatureDeriver::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Artifact {
                artifact: "estimator",
                ..
            }
        ));
    }

    #[test]
    fn test_adapter_lifecycle() {
        let adapter = InferenceAdapter::new();
        assert_eq!(adapter.state(), AdapterState::Unloaded);
        assert!(matches!(
            adapter.predict(&input(0)),
            Err(PipelineError::NotLoaded)
        ));

        assert!(adapter
            .load_with(|| Err(PipelineError::NotLoaded))
            .is_err());
        assert_eq!(adapter.state(), AdapterState::Unloaded);

        adapter.load_with(|| Ok(fitted_context().0)).unwrap();
        assert_eq!(adapter.state(), AdapterState::Loaded);
        assert!(adapter.predict(&input(0)).is_ok());
        assert_eq!(adapter.state(), AdapterState::Serving);
    }

    #[test]
    fn test_concurrent_loads_run_once() {
        let adapter = InferenceAdapter::new();
        let loads = AtomicUsize::new(0);
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    adapter
                        .load_with(|| {
                            loads.fetch_add(1, Ordering::SeqCst);
                            Ok(fitted_context().0)
                        })
                        .unwrap();
                    adapter.predict(&input(2)).unwrap();
                });
            }
        });
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(adapter.state(), AdapterState::Serving);
    }
}

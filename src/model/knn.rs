//! k-nearest-neighbours regression.

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_training_data, check_width, InferenceModel, TrainableModel};
use crate::error::{PipelineError, Result};

/// How neighbour targets are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weights {
    Uniform,
    /// Inverse-distance weighting. Exact matches (distance 0) take all the weight.
    #[default]
    Distance,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetric {
    #[default]
    Manhattan,
    Euclidean,
}

impl DistanceMetric {
    fn distance(self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        let pairs = a.iter().zip(b.iter());
        match self {
            DistanceMetric::Manhattan => pairs.map(|(x, y)| (x - y).abs()).sum(),
            DistanceMetric::Euclidean => pairs.map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt(),
        }
    }
}

/// k-NN regression hyperparameters.
///
/// Defaults: 9 neighbours, distance weighting, Manhattan metric.
#[derive(Clone, Debug)]
pub struct KNeighborsRegressor {
    n_neighbors: usize,
    weights: Weights,
    metric: DistanceMetric,
}

impl Default for KNeighborsRegressor {
    fn default() -> Self {
        Self {
            n_neighbors: 9,
            weights: Weights::default(),
            metric: DistanceMetric::default(),
        }
    }
}

impl KNeighborsRegressor {
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors,
            ..Self::default()
        }
    }

    pub fn with_weights(mut self, weights: Weights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }
}

/// Serializable state of a fitted k-NN model: the training set itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KnnParams {
    pub n_neighbors: usize,
    pub weights: Weights,
    pub metric: DistanceMetric,
    pub n_features: usize,
    /// Row-major training matrix.
    pub samples: Vec<f64>,
    pub targets: Vec<f64>,
}

#[derive(Clone, Debug)]
pub struct FittedKNeighborsRegressor {
    n_neighbors: usize,
    weights: Weights,
    metric: DistanceMetric,
    samples: Array2<f64>,
    targets: Array1<f64>,
}

impl TrainableModel for KNeighborsRegressor {
    type Fitted = FittedKNeighborsRegressor;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedKNeighborsRegressor> {
        check_training_data(x, y)?;
        if self.n_neighbors == 0 {
            return Err(PipelineError::InvalidParameter(
                "n_neighbors must be at least 1".to_string(),
            ));
        }
        debug!(
            samples = x.nrows(),
            n_neighbors = self.n_neighbors,
            "fitted k-nearest-neighbours"
        );
        Ok(FittedKNeighborsRegressor {
            n_neighbors: self.n_neighbors,
            weights: self.weights,
            metric: self.metric,
            samples: x.to_owned(),
            targets: y.to_owned(),
        })
    }
}

impl InferenceModel for FittedKNeighborsRegressor {
    type ParamsRepr = KnnParams;

    /// Fewer stored samples than `n_neighbors` uses every sample.
    fn predict(&self, x: ArrayView1<f64>) -> Result<f64> {
        check_width(self.samples.ncols(), x.len())?;

        let mut neighbours: Vec<(f64, usize)> = self
            .samples
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, row)| (self.metric.distance(row, x), i))
            .collect();
        // Ties go to the earlier training sample.
        neighbours.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        neighbours.truncate(self.n_neighbors);

        let targets = &self.targets;
        let prediction = match self.weights {
            Weights::Uniform => mean_target(targets, neighbours.iter().map(|&(_, i)| i)),
            Weights::Distance if neighbours.iter().any(|&(d, _)| d == 0.0) => mean_target(
                targets,
                neighbours.iter().filter(|&&(d, _)| d == 0.0).map(|&(_, i)| i),
            ),
            Weights::Distance => {
                let (num, den) = neighbours.iter().fold((0.0, 0.0), |(num, den), &(d, i)| {
                    (num + targets[i] / d, den + 1.0 / d)
                });
                num / den
            }
        };
        Ok(prediction)
    }

    fn n_features(&self) -> usize {
        self.samples.ncols()
    }

    fn extract_params(&self) -> KnnParams {
        KnnParams {
            n_neighbors: self.n_neighbors,
            weights: self.weights,
            metric: self.metric,
            n_features: self.samples.ncols(),
            samples: self.samples.iter().copied().collect(),
            targets: self.targets.to_vec(),
        }
    }

    fn from_params(params: KnnParams) -> Result<Self> {
        let n_rows = params.targets.len();
        let samples = Array2::from_shape_vec((n_rows, params.n_features), params.samples)
            .map_err(|e| PipelineError::Serialization(format!("k-NN sample matrix: {}", e)))?;
        if params.n_neighbors == 0 {
            return Err(PipelineError::Serialization(
                "k-NN params have n_neighbors = 0".to_string(),
            ));
        }
        Ok(Self {
            n_neighbors: params.n_neighbors,
            weights: params.weights,
            metric: params.metric,
            samples,
            targets: Array1::from(params.targets),
        })
    }
}

fn mean_target(targets: &Array1<f64>, indices: impl Iterator<Item = usize>) -> f64 {
    let (sum, n) = indices.fold((0.0, 0usize), |(sum, n), i| (sum + targets[i], n + 1));
    sum / n as f64
}

impl PartialEq for FittedKNeighborsRegressor {
    fn eq(&self, other: &Self) -> bool {
        self.extract_params() == other.extract_params()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn line() -> (Array2<f64>, Array1<f64>) {
        (
            array![[0.0], [1.0], [2.0], [3.0], [10.0]],
            array![0.0, 10.0, 20.0, 30.0, 100.0],
        )
    }

    #[test]
    fn test_uniform_average_of_nearest() {
        let (x, y) = line();
        let model = KNeighborsRegressor::new(2)
            .with_weights(Weights::Uniform)
            .fit(&x, &y)
            .unwrap();
        // Nearest to 1.4 are 1.0 and 2.0.
        assert_eq!(model.predict(array![1.4].view()).unwrap(), 15.0);
    }

    #[test]
    fn test_distance_weighting() {
        let (x, y) = line();
        let model = KNeighborsRegressor::new(2).fit(&x, &y).unwrap();
        // Distances 0.25 and 0.75 → weights 4 and 4/3.
        let pred = model.predict(array![1.25].view()).unwrap();
        let expected = (10.0 * 4.0 + 20.0 * (4.0 / 3.0)) / (4.0 + 4.0 / 3.0);
        assert!((pred - expected).abs() < 1e-12);
    }

    #[test]
    fn test_exact_match_takes_all_weight() {
        let (x, y) = line();
        let model = KNeighborsRegressor::new(3).fit(&x, &y).unwrap();
        assert_eq!(model.predict(array![3.0].view()).unwrap(), 30.0);
    }

    #[test]
    fn test_manhattan_vs_euclidean() {
        let x = array![[0.0, 0.0], [3.0, 3.0], [0.0, 5.0]];
        let y = array![1.0, 2.0, 3.0];
        // From (0, 0): Manhattan (0, 6, 5), Euclidean (0, 4.24, 5).
        let probe = array![0.1, 0.1];
        let manhattan = KNeighborsRegressor::new(2)
            .with_weights(Weights::Uniform)
            .fit(&x, &y)
            .unwrap();
        let euclidean = KNeighborsRegressor::new(2)
            .with_weights(Weights::Uniform)
            .with_metric(DistanceMetric::Euclidean)
            .fit(&x, &y)
            .unwrap();
        assert_eq!(manhattan.predict(probe.view()).unwrap(), 2.0);
        assert_eq!(euclidean.predict(probe.view()).unwrap(), 1.5);
    }

    #[test]
    fn test_k_larger_than_training_set() {
        let (x, y) = line();
        let model = KNeighborsRegressor::new(50)
            .with_weights(Weights::Uniform)
            .fit(&x, &y)
            .unwrap();
        assert_eq!(model.predict(array![0.5].view()).unwrap(), 32.0);
    }

    #[test]
    fn test_invalid_fit_and_width() {
        let (x, y) = line();
        assert!(KNeighborsRegressor::new(0).fit(&x, &y).is_err());
        let model = KNeighborsRegressor::default().fit(&x, &y).unwrap();
        assert!(matches!(
            model.predict(array![1.0, 2.0].view()),
            Err(PipelineError::FeatureMismatch {
                expected_features: 1,
                got_features: 2
            })
        ));
    }

    #[test]
    fn test_params_round_trip() {
        let x = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let y = array![1.0, 2.0, 3.0];
        let model = KNeighborsRegressor::default().fit(&x, &y).unwrap();
        let restored = FittedKNeighborsRegressor::from_params(model.extract_params()).unwrap();
        assert_eq!(restored, model);
        assert_eq!(
            restored.predict(array![2.0, 3.0].view()).unwrap(),
            model.predict(array![2.0, 3.0].view()).unwrap()
        );
    }
}

//! Seeded train/test split.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{PipelineError, Result};
use crate::table::Table;

/// Shuffle row indices with a seeded RNG and cut off the test share.
///
/// The test set has `ceil(n * test_size)` rows; both sides keep at least one
/// row. The same seed and row count always give the same partition.
pub fn split_indices(n_rows: usize, test_size: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::InvalidParameter(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }
    if n_rows < 2 {
        return Err(PipelineError::EmptyData(format!(
            "need at least 2 rows to split, got {}",
            n_rows
        )));
    }

    let n_test = ((n_rows as f64 * test_size).ceil() as usize).clamp(1, n_rows - 1);
    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok((train, indices))
}

/// Split a table into `(train, test)` tables.
pub fn train_test_split(table: &Table, test_size: f64, seed: u64) -> Result<(Table, Table)> {
    let (train, test) = split_indices(table.n_rows(), test_size, seed)?;
    Ok((table.take_rows(&train), table.take_rows(&test)))
}

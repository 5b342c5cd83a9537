//! Byte serialization of fitted parameters.
//!
//! Fitted encoders and estimators persist a plain parameter struct rather
//! than themselves. Parameter structs hold ordered containers only (`Vec`,
//! `BTreeMap`), so bincode output is a pure function of the fitted state:
//! saving, loading and saving again yields the same bytes.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Parameter representations that can be written to and read from bytes.
pub trait SerializableParams: Sized {
    fn to_bytes(&self) -> Result<Vec<u8>>;

    fn from_bytes(bytes: &[u8]) -> Result<Self>;

    fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    fn read_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_bytes(&fs::read(path)?)
    }
}

impl<T> SerializableParams for T
where
    T: Serialize + DeserializeOwned,
{
    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Params {
        weights: Vec<f64>,
        vocabulary: BTreeMap<String, usize>,
    }

    fn params() -> Params {
        Params {
            weights: vec![0.5, -1.25, f64::MIN_POSITIVE],
            vocabulary: [("Kew".to_string(), 1), ("Abbotsford".to_string(), 0)]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn test_bytes_are_stable_across_reload() {
        let bytes = params().to_bytes().unwrap();
        let reloaded = Params::from_bytes(&bytes).unwrap();
        assert_eq!(reloaded, params());
        assert_eq!(reloaded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.bin");
        params().write_to(&path).unwrap();
        assert_eq!(Params::read_from(&path).unwrap(), params());
    }

    #[test]
    fn test_truncated_bytes_fail() {
        let bytes = params().to_bytes().unwrap();
        let result = Params::from_bytes(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(PipelineError::Serialization(_))));
    }
}

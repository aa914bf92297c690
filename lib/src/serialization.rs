//! Serialization of fitted transformer parameters.
//!
//! Fitted state is plain data (medians, bounds, reference statistics) and is
//! persisted next to the model it was fit for, so serving reuses exactly the
//! statistics seen at training time.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::path::Path;

/// Learned statistics that persist as a byte buffer.
///
/// Implementors should contain only plain data (numbers, strings, maps), never
/// handles or references into a live transformer.
pub trait SerializableParams: Sized {
    type Error: Error + Send + Sync + 'static;

    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error>;

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error>;
}

impl<T> SerializableParams for T
where
    T: Serialize + DeserializeOwned,
{
    type Error = bincode::Error;

    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error> {
        bincode::serialize(self)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error> {
        bincode::deserialize(bytes)
    }
}

/// Write any serde value as pretty JSON.
pub fn write_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> crate::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text)?;
    Ok(())
}

/// Read a serde value from a JSON file.
pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> crate::Result<T> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

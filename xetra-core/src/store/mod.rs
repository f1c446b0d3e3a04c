//! Object store adapter.
//!
//! The [`ObjectStore`] trait abstracts over key-value blob storage organized
//! in named containers (buckets). The pipeline only ever needs three
//! operations: fetch bytes by key, store bytes at a key, and list a
//! container. Tabular encoding lives one layer up in [`crate::table`].

pub mod local;
pub mod memory;

pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// Descriptor of one stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub key: String,
}

impl ObjectInfo {
    /// Parse the key's first path segment as a date (`2021-04-22/file.csv`).
    ///
    /// Returns `None` when the segment is not a date in `date_format`.
    pub fn source_date(&self, date_format: &str) -> Option<NaiveDate> {
        let segment = self.key.split('/').next()?;
        NaiveDate::parse_from_str(segment, date_format).ok()
    }
}

/// Key-value blob storage with named containers.
pub trait ObjectStore: Send + Sync {
    /// Human-readable name of this backend.
    fn name(&self) -> &str;

    /// Fetch the bytes stored at `key`. Fails with [`DataError::NotFound`]
    /// when the key is absent.
    fn get(&self, container: &str, key: &str) -> Result<Vec<u8>, DataError>;

    /// Store `bytes` at `key`, replacing any existing object.
    fn put(&self, container: &str, key: &str, bytes: &[u8]) -> Result<(), DataError>;

    /// All objects in a container, sorted by key. An unknown container is empty.
    fn list(&self, container: &str) -> Result<Vec<ObjectInfo>, DataError>;

    /// Whether an object exists at `key`.
    fn exists(&self, container: &str, key: &str) -> Result<bool, DataError> {
        match self.get(container, key) {
            Ok(_) => Ok(true),
            Err(DataError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(key: &str) -> ObjectInfo {
        ObjectInfo { key: key.into() }
    }

    #[test]
    fn source_date_from_first_segment() {
        assert_eq!(
            info("2021-04-22/2021-04-22_BINS_XETR08.csv").source_date("%Y-%m-%d"),
            NaiveDate::from_ymd_opt(2021, 4, 22)
        );
    }

    #[test]
    fn source_date_rejects_non_date_keys() {
        assert_eq!(info("meta_file.csv").source_date("%Y-%m-%d"), None);
        assert_eq!(info("reports/2021-04-22.csv").source_date("%Y-%m-%d"), None);
    }

    #[test]
    fn source_date_honours_format() {
        assert_eq!(
            info("20210422/a.csv").source_date("%Y%m%d"),
            NaiveDate::from_ymd_opt(2021, 4, 22)
        );
    }
}

//! Blob storage for source archives and converted tables.
//!
//! Artifacts are flat names (`COTAHIST_A2000.ZIP`, `COTAHIST_A2000.parquet`)
//! stored under one root. Backends:
//! - [`LocalStore`]: a directory, created on first use, atomic writes
//! - [`ObjectStore`]: an S3-compatible bucket (optionally under a prefix)
//! - [`MemoryStore`]: in-process map, for tests and dry runs

pub mod local;
pub mod memory;
pub mod object;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use object::ObjectStore;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{op} '{name}' failed: {reason}")]
    Io {
        op: &'static str,
        name: String,
        reason: String,
    },

    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("invalid artifact name '{0}'")]
    InvalidName(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub(crate) fn io(op: &'static str, name: &str, err: impl fmt::Display) -> Self {
        StorageError::Io {
            op,
            name: name.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Flat key-value store of artifacts.
pub trait BlobStore: Send + Sync {
    /// Names currently stored, sorted.
    fn list(&self) -> Result<Vec<String>, StorageError>;

    fn read(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Store `bytes` under `name`. Readers never observe a partial artifact.
    fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError>;

    fn delete(&self, name: &str) -> Result<(), StorageError>;

    /// Human-readable location of `name` (path or URI).
    fn location(&self, name: &str) -> String;
}

/// Which backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackend {
    #[default]
    Local,
    ObjectStore,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(StorageBackend::Local),
            "object-store" | "s3" => Ok(StorageBackend::ObjectStore),
            other => Err(format!("unknown storage backend '{other}'")),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Local => write!(f, "local"),
            StorageBackend::ObjectStore => write!(f, "object-store"),
        }
    }
}

/// Open the store for `backend` rooted at `root` (a directory for
/// [`StorageBackend::Local`], `bucket[/prefix]` for
/// [`StorageBackend::ObjectStore`]).
pub fn open_store(backend: StorageBackend, root: &str) -> Result<Box<dyn BlobStore>, StorageError> {
    match backend {
        StorageBackend::Local => Ok(Box::new(LocalStore::new(root))),
        StorageBackend::ObjectStore => Ok(Box::new(ObjectStore::connect(root)?)),
    }
}

/// Names are single path components: no separators, no control characters.
pub(crate) fn validate_name(name: &str) -> Result<(), StorageError> {
    let ok = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.chars().any(|c| matches!(c, '/' | '\\') || c.is_control());
    if ok {
        Ok(())
    } else {
        Err(StorageError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parses_from_config_strings() {
        assert_eq!("local".parse::<StorageBackend>(), Ok(StorageBackend::Local));
        assert_eq!(
            "object-store".parse::<StorageBackend>(),
            Ok(StorageBackend::ObjectStore)
        );
        assert_eq!("S3".parse::<StorageBackend>(), Ok(StorageBackend::ObjectStore));
        assert!("ftp".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn backend_display_matches_serde_names() {
        assert_eq!(StorageBackend::ObjectStore.to_string(), "object-store");
        assert_eq!(StorageBackend::default().to_string(), "local");
    }

    #[test]
    fn names_must_be_plain_components() {
        assert!(validate_name("COTAHIST_A2000.ZIP").is_ok());
        assert!(validate_name("COTAHIST_A2000.parquet").is_ok());
        assert!(validate_name("COTAHIST_A2000 (1).ZIP").is_ok());
        for bad in ["", ".", "..", "../etc", "a/b", "a\\b", "a\0b", "a\nb"] {
            assert!(validate_name(bad).is_err(), "{bad:?}");
        }
    }
}

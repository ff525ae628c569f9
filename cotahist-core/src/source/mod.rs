//! Remote catalog and fetch service.
//!
//! The [`SeriesSource`] trait abstracts over where the exchange's files come
//! from so the orchestrators can be driven by a fake in tests. The storage
//! layer sits below this trait; sources don't know about it.

pub mod http;

pub use http::B3HttpSource;

use crate::naming::{classify, Granularity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("remote catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("fetch of '{file_name}' failed: {reason}")]
    FetchFailed { file_name: String, reason: String },
}

/// One file the upstream advertises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Human label (`2000`, `Jan/2023`, `01/10/2026`).
    pub name: String,
    pub granularity: Granularity,
    pub file_name: String,
}

/// Everything the upstream advertises, bucketed by granularity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCatalog {
    pub annual: Vec<CatalogEntry>,
    pub monthly: Vec<CatalogEntry>,
    pub daily: Vec<CatalogEntry>,
}

impl RemoteCatalog {
    /// Bucket raw file names by their classification, keeping input order.
    /// Names that do not classify are dropped.
    pub fn from_file_names<I, S>(file_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalog = RemoteCatalog::default();
        for file_name in file_names {
            let Some(artifact) = classify(file_name.as_ref()) else {
                continue;
            };
            let entry = CatalogEntry {
                name: artifact.period.label(),
                granularity: artifact.granularity(),
                file_name: artifact.name,
            };
            catalog.bucket_mut(entry.granularity).push(entry);
        }
        catalog
    }

    pub fn bucket(&self, granularity: Granularity) -> &[CatalogEntry] {
        match granularity {
            Granularity::Annual => &self.annual,
            Granularity::Monthly => &self.monthly,
            Granularity::Daily => &self.daily,
        }
    }

    fn bucket_mut(&mut self, granularity: Granularity) -> &mut Vec<CatalogEntry> {
        match granularity {
            Granularity::Annual => &mut self.annual,
            Granularity::Monthly => &mut self.monthly,
            Granularity::Daily => &mut self.daily,
        }
    }

    pub fn len(&self) -> usize {
        self.annual.len() + self.monthly.len() + self.daily.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Catalog and fetch service for the exchange's series files.
pub trait SeriesSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Everything currently advertised. Fatal for the run on failure.
    fn list_available(&self) -> Result<RemoteCatalog, SourceError>;

    /// Raw bytes of one advertised file.
    fn fetch(&self, file_name: &str) -> Result<Vec<u8>, SourceError>;
}

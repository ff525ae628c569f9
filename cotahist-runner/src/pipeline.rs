//! End-to-end runs.
//!
//! - [`sync_series`]: snapshot, plan, download, then clean up superseded files
//! - [`sync_parquets`]: convert every archive that has no Parquet yet
//! - [`sync_all`]: both, in that order

use crate::batch::BatchReport;
use crate::cleanup::cleanup;
use crate::config::SyncConfig;
use crate::convert::{convert, missing_conversions};
use crate::download::download;
use crate::error::SyncError;
use crate::progress::SyncProgress;
use crate::reconcile::{plan, LocalCatalog, PlannedArtifact};
use chrono::NaiveDate;
use cotahist_core::source::{RemoteCatalog, SeriesSource, SourceError};
use cotahist_core::storage::BlobStore;
use tracing::info;

#[derive(Debug)]
pub struct SeriesReport {
    pub plan: Vec<PlannedArtifact>,
    pub download: BatchReport,
    pub removed: Vec<String>,
}

#[derive(Debug)]
pub struct SyncAllReport {
    pub series: SeriesReport,
    pub parquets: BatchReport,
}

impl SyncAllReport {
    pub fn has_failures(&self) -> bool {
        self.series.download.has_failures() || self.parquets.has_failures()
    }
}

/// Fetch the remote catalog. Any failure here is fatal for the run.
pub fn remote_catalog(source: &dyn SeriesSource) -> Result<RemoteCatalog, SyncError> {
    source.list_available().map_err(|e| match e {
        SourceError::CatalogUnavailable(reason) => SyncError::CatalogUnavailable(reason),
        other => SyncError::CatalogUnavailable(other.to_string()),
    })
}

/// Compute the download plan without fetching anything.
pub fn dry_run(
    source: &dyn SeriesSource,
    store: &dyn BlobStore,
    today: NaiveDate,
) -> Result<Vec<PlannedArtifact>, SyncError> {
    let local = LocalCatalog::snapshot(store)?;
    let remote = remote_catalog(source)?;
    Ok(plan(&remote, &local, today))
}

pub fn sync_series(
    config: &SyncConfig,
    source: &dyn SeriesSource,
    store: &dyn BlobStore,
    today: NaiveDate,
    progress: &dyn SyncProgress,
) -> Result<SeriesReport, SyncError> {
    let planned = dry_run(source, store, today)?;
    info!(source = source.name(), planned = planned.len(), "series plan ready");

    let work_list: Vec<String> = planned.iter().map(|p| p.file_name.clone()).collect();
    let report = download(
        &work_list,
        source,
        store,
        config.download_budget(),
        config.download_policy,
        progress,
    );
    info!(
        "Downloaded {} series. Missing {} series.",
        report.completed.len(),
        report.remaining.len()
    );

    let local = LocalCatalog::snapshot(store)?;
    let removed = cleanup(store, &local, today)?;

    Ok(SeriesReport {
        plan: planned,
        download: report,
        removed,
    })
}

pub fn sync_parquets(
    config: &SyncConfig,
    store: &dyn BlobStore,
    progress: &dyn SyncProgress,
) -> Result<BatchReport, SyncError> {
    let local = LocalCatalog::snapshot(store)?;
    let missing = missing_conversions(&local);
    info!(missing = missing.len(), "archives without parquet");

    let report = convert(
        &missing,
        store,
        config.convert_budget(),
        config.convert_policy,
        progress,
    );
    info!(
        "Converted {} parquets. {} remaining.",
        report.completed.len(),
        report.remaining.len()
    );
    Ok(report)
}

pub fn sync_all(
    config: &SyncConfig,
    source: &dyn SeriesSource,
    store: &dyn BlobStore,
    today: NaiveDate,
    progress: &dyn SyncProgress,
) -> Result<SyncAllReport, SyncError> {
    let series = sync_series(config, source, store, today, progress)?;
    let parquets = sync_parquets(config, store, progress)?;
    Ok(SyncAllReport { series, parquets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentProgress;
    use cotahist_core::storage::MemoryStore;

    struct DownSource;

    impl SeriesSource for DownSource {
        fn name(&self) -> &str {
            "down"
        }

        fn list_available(&self) -> Result<RemoteCatalog, SourceError> {
            Err(SourceError::CatalogUnavailable("HTTP 503".into()))
        }

        fn fetch(&self, file_name: &str) -> Result<Vec<u8>, SourceError> {
            Err(SourceError::FetchFailed {
                file_name: file_name.into(),
                reason: "unreachable".into(),
            })
        }
    }

    #[test]
    fn unavailable_catalog_is_fatal_and_touches_nothing() {
        let store = MemoryStore::with_entries([("COTAHIST_M012020.ZIP", vec![1])]);
        let result = sync_series(
            &SyncConfig::default(),
            &DownSource,
            &store,
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            &SilentProgress,
        );

        assert!(matches!(result, Err(SyncError::CatalogUnavailable(ref r)) if r == "HTTP 503"));
        // No cleanup without a plan.
        assert!(store.contains("COTAHIST_M012020.ZIP"));
    }

    #[test]
    fn parquet_sync_on_empty_store_is_a_no_op() {
        let store = MemoryStore::new();
        let report = sync_parquets(&SyncConfig::default(), &store, &SilentProgress).unwrap();
        assert_eq!(report.planned, 0);
        assert!(!report.has_failures());
    }
}

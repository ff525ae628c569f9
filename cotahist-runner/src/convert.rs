//! Conversion orchestrator: decode stored archives into Parquet.
//!
//! A source is converted at most once: [`missing_conversions`] only lists
//! archives whose converted counterpart is absent. The Parquet bytes are
//! fully built before the single store write, so a failed decode leaves
//! nothing behind.

use crate::batch::{run_batch, BatchReport};
use crate::config::FailurePolicy;
use crate::error::SyncError;
use crate::progress::{Stage, SyncProgress};
use crate::reconcile::LocalCatalog;
use cotahist_core::decode::{decode, encode_parquet};
use cotahist_core::naming::{is_source_archive, to_converted_name};
use cotahist_core::storage::BlobStore;
use std::time::Duration;
use tracing::debug;

/// Local archives without a converted counterpart, in listing order.
pub fn missing_conversions(local: &LocalCatalog) -> Vec<String> {
    local
        .iter()
        .filter(|name| is_source_archive(name))
        .filter(|name| !local.contains(&to_converted_name(name)))
        .map(str::to_string)
        .collect()
}

pub fn convert(
    list: &[String],
    store: &dyn BlobStore,
    budget: Duration,
    policy: FailurePolicy,
    progress: &dyn SyncProgress,
) -> BatchReport {
    run_batch(Stage::Convert, list, budget, policy, progress, |name| {
        convert_one(name, store)
    })
}

fn convert_one(name: &str, store: &dyn BlobStore) -> Result<String, SyncError> {
    let archive = store
        .read(name)
        .map_err(|e| SyncError::storage("read", name, e))?;
    let table = decode(&archive).map_err(|e| SyncError::decode(name, e))?;
    let parquet = encode_parquet(&table).map_err(|e| SyncError::decode(name, e))?;
    debug!(name, rows = table.height(), bytes = parquet.len(), "decoded");

    let output = to_converted_name(name);
    store
        .write(&output, &parquet)
        .map_err(|e| SyncError::storage("write", &output, e))?;
    Ok(store.location(&output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentProgress;
    use cotahist_core::decode::read_parquet;
    use cotahist_core::sample::{reference_records, sample_archive};
    use cotahist_core::storage::MemoryStore;

    #[test]
    fn only_archives_without_counterpart_are_missing() {
        let local = LocalCatalog::from_names([
            "COTAHIST_A2000.ZIP",
            "COTAHIST_A2000.parquet",
            "COTAHIST_A2001.ZIP",
            "COTAHIST_M012026.zip",
            "COTAHIST_A2002.parquet",
            "README.md",
        ]);
        assert_eq!(
            missing_conversions(&local),
            ["COTAHIST_A2001.ZIP", "COTAHIST_M012026.zip"]
        );
    }

    #[test]
    fn conversion_writes_parquet_next_to_the_archive() {
        let store = MemoryStore::with_entries([(
            "COTAHIST_A2023.ZIP",
            sample_archive(&reference_records()).unwrap(),
        )]);
        let list = vec!["COTAHIST_A2023.ZIP".to_string()];

        let report = convert(
            &list,
            &store,
            Duration::from_secs(60),
            FailurePolicy::SkipItem,
            &SilentProgress,
        );

        assert_eq!(report.completed[0].location, "memory://COTAHIST_A2023.parquet");
        let table = read_parquet(&store.read("COTAHIST_A2023.parquet").unwrap()).unwrap();
        assert_eq!(table.shape(), (3, 26));
    }

    #[test]
    fn decode_failure_skips_only_that_artifact() {
        let store = MemoryStore::with_entries([
            ("COTAHIST_A2021.ZIP", b"not a zip".to_vec()),
            (
                "COTAHIST_A2022.ZIP",
                sample_archive(&reference_records()).unwrap(),
            ),
        ]);
        let list = missing_conversions(&LocalCatalog::snapshot(&store).unwrap());

        let report = convert(
            &list,
            &store,
            Duration::from_secs(60),
            FailurePolicy::SkipItem,
            &SilentProgress,
        );

        assert_eq!(report.completed_names(), ["COTAHIST_A2022.ZIP"]);
        assert_eq!(report.remaining, ["COTAHIST_A2021.ZIP"]);
        assert!(matches!(
            &report.failures[0].error,
            SyncError::DecodeFailed { artifact, .. } if artifact == "COTAHIST_A2021.ZIP"
        ));
        assert!(!store.contains("COTAHIST_A2021.parquet"));
    }

    #[test]
    fn converted_sources_are_not_listed_again() {
        let store = MemoryStore::with_entries([(
            "COTAHIST_A2023.ZIP",
            sample_archive(&reference_records()).unwrap(),
        )]);
        let first = missing_conversions(&LocalCatalog::snapshot(&store).unwrap());
        convert(
            &first,
            &store,
            Duration::from_secs(60),
            FailurePolicy::SkipItem,
            &SilentProgress,
        );

        let second = missing_conversions(&LocalCatalog::snapshot(&store).unwrap());
        assert!(second.is_empty());
    }

    #[test]
    fn missing_archive_is_a_storage_failure() {
        let store = MemoryStore::new();
        let list = vec!["COTAHIST_A1999.ZIP".to_string()];
        let report = convert(
            &list,
            &store,
            Duration::from_secs(60),
            FailurePolicy::SkipItem,
            &SilentProgress,
        );
        assert!(matches!(
            report.failures[0].error,
            SyncError::StorageFailed { op: "read", .. }
        ));
    }
}

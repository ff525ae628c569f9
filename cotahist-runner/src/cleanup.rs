//! Retire superseded monthly and daily artifacts.
//!
//! Monthly files outside the current year and daily files outside the
//! current month are removed, source and converted alike. Annual and
//! unrecognized names are never touched.

use crate::error::SyncError;
use crate::reconcile::LocalCatalog;
use chrono::NaiveDate;
use cotahist_core::naming::{classify, Period};
use cotahist_core::storage::{BlobStore, StorageError};
use tracing::{info, warn};

/// Whether a stored artifact for `period` has been superseded as of `today`.
pub fn is_stale(period: &Period, today: NaiveDate) -> bool {
    match period {
        Period::Annual { .. } => false,
        Period::Monthly { .. } => !period.in_year_of(today),
        Period::Daily { .. } => !period.in_month_of(today),
    }
}

/// Delete every stale artifact in `local`; returns the names removed.
pub fn cleanup(
    store: &dyn BlobStore,
    local: &LocalCatalog,
    today: NaiveDate,
) -> Result<Vec<String>, SyncError> {
    let mut removed = Vec::new();
    for name in local.iter() {
        let Some(artifact) = classify(name) else {
            continue;
        };
        if !is_stale(&artifact.period, today) {
            continue;
        }
        match store.delete(name) {
            Ok(()) => {
                info!("removed {name}");
                removed.push(name.to_string());
            }
            // Gone since the snapshot.
            Err(StorageError::NotFound(_)) => warn!("{name} already removed"),
            Err(e) => return Err(SyncError::storage("delete", name, e)),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cotahist_core::storage::MemoryStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn store_with(names: &[&str]) -> MemoryStore {
        MemoryStore::with_entries(names.iter().map(|n| (*n, vec![0u8])))
    }

    #[test]
    fn removes_prior_year_monthly_and_prior_month_daily() {
        let store = store_with(&[
            "COTAHIST_A2020.ZIP",
            "COTAHIST_M122025.ZIP",
            "COTAHIST_M122025.parquet",
            "COTAHIST_M092026.ZIP",
            "COTAHIST_D30092026.ZIP",
            "COTAHIST_D01102026.ZIP",
            "COTAHIST_D01102025.ZIP",
            "notes.txt",
        ]);
        let local = LocalCatalog::snapshot(&store).unwrap();

        let removed = cleanup(&store, &local, today()).unwrap();

        assert_eq!(
            removed,
            [
                "COTAHIST_D01102025.ZIP",
                "COTAHIST_D30092026.ZIP",
                "COTAHIST_M122025.ZIP",
                "COTAHIST_M122025.parquet",
            ]
        );
        assert_eq!(
            store.list().unwrap(),
            [
                "COTAHIST_A2020.ZIP",
                "COTAHIST_D01102026.ZIP",
                "COTAHIST_M092026.ZIP",
                "notes.txt",
            ]
        );
    }

    #[test]
    fn lowercase_names_are_cleaned_too() {
        let store = store_with(&["cotahist_m012024.zip"]);
        let local = LocalCatalog::snapshot(&store).unwrap();
        assert_eq!(cleanup(&store, &local, today()).unwrap(), ["cotahist_m012024.zip"]);
    }

    #[test]
    fn names_missing_since_snapshot_are_tolerated() {
        let store = MemoryStore::new();
        let local = LocalCatalog::from_names(["COTAHIST_M012024.ZIP"]);
        assert!(cleanup(&store, &local, today()).unwrap().is_empty());
    }

    #[test]
    fn annual_is_never_stale() {
        assert!(!is_stale(&Period::Annual { year: 1990 }, today()));
        assert!(is_stale(&Period::Monthly { year: 2025, month: 10 }, today()));
        assert!(!is_stale(&Period::Monthly { year: 2026, month: 10 }, today()));
        assert!(is_stale(&Period::Daily { year: 2026, month: 9, day: 30 }, today()));
    }
}

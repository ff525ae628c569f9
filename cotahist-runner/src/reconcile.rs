//! Reconciliation: which advertised artifacts are not yet mirrored.
//!
//! Eligibility per granularity, relative to `today`:
//! - annual: the year is over
//! - monthly: this year, but not the current (still growing) month
//! - daily: the current month
//!
//! Past months and years are covered by the coarser file once published, so
//! their daily and monthly files are neither planned nor kept (see
//! [`crate::cleanup`]).

use crate::error::SyncError;
use chrono::{Datelike, NaiveDate};
use cotahist_core::naming::{classify, Granularity, Period};
use cotahist_core::source::RemoteCatalog;
use cotahist_core::storage::BlobStore;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

/// Names present in the store at the start of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalCatalog {
    names: BTreeSet<String>,
}

impl LocalCatalog {
    pub fn snapshot(store: &dyn BlobStore) -> Result<Self, SyncError> {
        let names = store
            .list()
            .map_err(|e| SyncError::storage("list", &store.location(""), e))?;
        debug!(count = names.len(), "local catalog snapshot");
        Ok(Self::from_names(names))
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact, case-sensitive membership.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One artifact to download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedArtifact {
    pub file_name: String,
    pub label: String,
    pub granularity: Granularity,
    pub period: Period,
}

/// Missing, eligible artifacts: annual first, then monthly, then daily, in
/// catalog order within each granularity.
pub fn plan(remote: &RemoteCatalog, local: &LocalCatalog, today: NaiveDate) -> Vec<PlannedArtifact> {
    let mut planned = Vec::new();
    let mut seen = HashSet::new();

    for granularity in [Granularity::Annual, Granularity::Monthly, Granularity::Daily] {
        for entry in remote.bucket(granularity) {
            let Some(artifact) = classify(&entry.file_name) else {
                warn!(file_name = %entry.file_name, "unrecognized catalog entry, skipping");
                continue;
            };
            if artifact.granularity() != granularity {
                warn!(
                    file_name = %entry.file_name,
                    listed_as = %granularity,
                    "catalog entry in the wrong bucket, skipping"
                );
                continue;
            }
            if local.contains(&entry.file_name)
                || !is_eligible(&artifact.period, today)
                || !seen.insert(entry.file_name.as_str())
            {
                continue;
            }
            planned.push(PlannedArtifact {
                file_name: entry.file_name.clone(),
                label: entry.name.clone(),
                granularity,
                period: artifact.period,
            });
        }
    }

    planned
}

/// Whether a period is worth mirroring as of `today`.
pub fn is_eligible(period: &Period, today: NaiveDate) -> bool {
    match period {
        Period::Annual { year } => *year < today.year(),
        Period::Monthly { .. } => period.in_year_of(today) && !period.in_month_of(today),
        Period::Daily { .. } => period.in_month_of(today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cotahist_core::source::CatalogEntry;
    use cotahist_core::storage::MemoryStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn file_names(plan: &[PlannedArtifact]) -> Vec<&str> {
        plan.iter().map(|p| p.file_name.as_str()).collect()
    }

    fn catalog() -> RemoteCatalog {
        RemoteCatalog::from_file_names([
            "COTAHIST_A2024.ZIP",
            "COTAHIST_A2025.ZIP",
            "COTAHIST_A2026.ZIP",
            "COTAHIST_M082026.ZIP",
            "COTAHIST_M092026.ZIP",
            "COTAHIST_M102026.ZIP",
            "COTAHIST_M122025.ZIP",
            "COTAHIST_D30092026.ZIP",
            "COTAHIST_D01102026.ZIP",
            "COTAHIST_D16102026.ZIP",
        ])
    }

    #[test]
    fn plan_applies_eligibility_per_granularity() {
        let plan = plan(&catalog(), &LocalCatalog::default(), today());
        assert_eq!(
            file_names(&plan),
            [
                "COTAHIST_A2024.ZIP",
                "COTAHIST_A2025.ZIP",
                "COTAHIST_M082026.ZIP",
                "COTAHIST_M092026.ZIP",
                "COTAHIST_D01102026.ZIP",
                "COTAHIST_D16102026.ZIP",
            ]
        );
        assert_eq!(plan[2].label, "Ago/2026");
        assert_eq!(plan[4].granularity, Granularity::Daily);
    }

    #[test]
    fn plan_skips_local_names() {
        let local = LocalCatalog::from_names(["COTAHIST_A2024.ZIP", "COTAHIST_D01102026.ZIP"]);
        let plan = plan(&catalog(), &local, today());
        assert!(!file_names(&plan).contains(&"COTAHIST_A2024.ZIP"));
        assert!(!file_names(&plan).contains(&"COTAHIST_D01102026.ZIP"));
        assert_eq!(plan.len(), 4);
    }

    #[test]
    fn local_comparison_is_case_sensitive() {
        let local = LocalCatalog::from_names(["cotahist_a2024.zip"]);
        let plan = plan(&catalog(), &local, today());
        assert!(file_names(&plan).contains(&"COTAHIST_A2024.ZIP"));
    }

    #[test]
    fn converted_counterpart_does_not_satisfy_the_plan() {
        let local = LocalCatalog::from_names(["COTAHIST_A2025.parquet"]);
        let plan = plan(&catalog(), &local, today());
        assert!(file_names(&plan).contains(&"COTAHIST_A2025.ZIP"));
    }

    #[test]
    fn misfiled_and_unrecognized_entries_are_skipped() {
        let mut remote = RemoteCatalog::default();
        remote.annual.push(CatalogEntry {
            name: "Set/2026".into(),
            granularity: Granularity::Annual,
            file_name: "COTAHIST_M092026.ZIP".into(),
        });
        remote.monthly.push(CatalogEntry {
            name: "?".into(),
            granularity: Granularity::Monthly,
            file_name: "SERIES_2026.ZIP".into(),
        });
        remote.daily.push(CatalogEntry {
            name: "02/10/2026".into(),
            granularity: Granularity::Daily,
            file_name: "COTAHIST_D02102026.ZIP".into(),
        });

        let plan = plan(&remote, &LocalCatalog::default(), today());
        assert_eq!(file_names(&plan), ["COTAHIST_D02102026.ZIP"]);
    }

    #[test]
    fn duplicate_catalog_entries_are_planned_once() {
        let remote = RemoteCatalog::from_file_names(["COTAHIST_A2000.ZIP", "COTAHIST_A2000.ZIP"]);
        assert_eq!(plan(&remote, &LocalCatalog::default(), today()).len(), 1);
    }

    #[test]
    fn january_has_no_monthly_work() {
        let jan = NaiveDate::from_ymd_opt(2027, 1, 5).unwrap();
        let remote = RemoteCatalog::from_file_names([
            "COTAHIST_M122026.ZIP",
            "COTAHIST_M012027.ZIP",
            "COTAHIST_A2026.ZIP",
        ]);
        let plan = plan(&remote, &LocalCatalog::default(), jan);
        assert_eq!(file_names(&plan), ["COTAHIST_A2026.ZIP"]);
    }

    #[test]
    fn snapshot_reads_the_store() {
        let store = MemoryStore::with_entries([("COTAHIST_A2000.ZIP", vec![1]), ("notes", vec![])]);
        let local = LocalCatalog::snapshot(&store).unwrap();
        assert_eq!(local.len(), 2);
        assert!(local.contains("notes"));
        assert_eq!(local.iter().collect::<Vec<_>>(), ["COTAHIST_A2000.ZIP", "notes"]);
    }
}

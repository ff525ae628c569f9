//! Download orchestrator: fetch each planned file and store it under its name.

use crate::batch::{run_batch, BatchReport};
use crate::config::FailurePolicy;
use crate::error::SyncError;
use crate::progress::{Stage, SyncProgress};
use cotahist_core::source::SeriesSource;
use cotahist_core::storage::BlobStore;
use std::time::Duration;

pub fn download(
    work_list: &[String],
    source: &dyn SeriesSource,
    store: &dyn BlobStore,
    budget: Duration,
    policy: FailurePolicy,
    progress: &dyn SyncProgress,
) -> BatchReport {
    run_batch(Stage::Download, work_list, budget, policy, progress, |file_name| {
        let bytes = source.fetch(file_name)?;
        store
            .write(file_name, &bytes)
            .map_err(|e| SyncError::storage("write", file_name, e))?;
        Ok(store.location(file_name))
    })
}

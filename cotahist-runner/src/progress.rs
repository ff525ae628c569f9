//! Progress callbacks for the download and conversion batches.

use crate::batch::BatchReport;
use crate::error::SyncError;
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// Which orchestrator a batch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Download,
    Convert,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Download => write!(f, "download"),
            Stage::Convert => write!(f, "convert"),
        }
    }
}

/// Progress callback for batch operations.
pub trait SyncProgress: Send {
    /// Called before an item is attempted.
    fn on_start(&self, stage: Stage, name: &str, index: usize, total: usize);

    /// Called when an item finishes. `outcome` is the output location on
    /// success.
    fn on_complete(
        &self,
        stage: Stage,
        name: &str,
        index: usize,
        total: usize,
        elapsed: Duration,
        outcome: Result<&str, &SyncError>,
    );

    /// Called once the batch is over, however it ended.
    fn on_batch_complete(&self, report: &BatchReport);
}

/// Progress reporter that logs through `tracing`.
pub struct TracingProgress;

impl SyncProgress for TracingProgress {
    fn on_start(&self, stage: Stage, name: &str, index: usize, total: usize) {
        info!("[{}/{}] {stage} {name}...", index + 1, total);
    }

    fn on_complete(
        &self,
        stage: Stage,
        name: &str,
        _index: usize,
        _total: usize,
        elapsed: Duration,
        outcome: Result<&str, &SyncError>,
    ) {
        match outcome {
            Ok(location) => info!(
                %stage,
                elapsed_secs = elapsed.as_secs_f64(),
                "{name} -> {location}"
            ),
            Err(e) => warn!(%stage, elapsed_secs = elapsed.as_secs_f64(), "{name} failed: {e}"),
        }
    }

    fn on_batch_complete(&self, report: &BatchReport) {
        info!(
            stage = %report.stage,
            planned = report.planned,
            completed = report.completed.len(),
            failed = report.failures.len(),
            remaining = report.remaining.len(),
            "{} batch finished",
            report.stage
        );
    }
}

/// Progress reporter that does nothing.
pub struct SilentProgress;

impl SyncProgress for SilentProgress {
    fn on_start(&self, _: Stage, _: &str, _: usize, _: usize) {}

    fn on_complete(
        &self,
        _: Stage,
        _: &str,
        _: usize,
        _: usize,
        _: Duration,
        _: Result<&str, &SyncError>,
    ) {
    }

    fn on_batch_complete(&self, _: &BatchReport) {}
}

//! Time-boxed sequential batches.
//!
//! Items run strictly in order. The budget is checked before each item: once
//! elapsed time reaches it, the batch stops without starting the next item.
//! A started item is never interrupted. `remaining` is everything planned
//! but not completed, in plan order, so the next run picks it up.

use crate::config::FailurePolicy;
use crate::error::SyncError;
use crate::progress::{Stage, SyncProgress};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Wall-clock allowance for one batch.
#[derive(Debug, Clone, Copy)]
pub struct TimeBudget {
    started: Instant,
    limit: Duration,
}

impl TimeBudget {
    pub fn start(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn exhausted(&self) -> bool {
        self.elapsed() >= self.limit
    }
}

/// Why a batch ended before its last item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum StopReason {
    BudgetExhausted,
    /// [`FailurePolicy::AbortBatch`] tripped on this item.
    Aborted { at: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedItem {
    pub name: String,
    /// Where the output landed (path or URI).
    pub location: String,
}

#[derive(Debug)]
pub struct ItemFailure {
    pub name: String,
    pub error: SyncError,
}

#[derive(Debug)]
pub struct BatchReport {
    pub stage: Stage,
    pub planned: usize,
    pub completed: Vec<CompletedItem>,
    pub failures: Vec<ItemFailure>,
    /// Planned but not completed, failed items included.
    pub remaining: Vec<String>,
    pub stopped: Option<StopReason>,
}

impl BatchReport {
    fn new(stage: Stage, planned: usize) -> Self {
        Self {
            stage,
            planned,
            completed: Vec::new(),
            failures: Vec::new(),
            remaining: Vec::new(),
            stopped: None,
        }
    }

    pub fn completed_names(&self) -> Vec<&str> {
        self.completed.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Run `work` over `items` in order under `budget`. `work` returns the output
/// location of an item.
pub fn run_batch<F>(
    stage: Stage,
    items: &[String],
    budget: Duration,
    policy: FailurePolicy,
    progress: &dyn SyncProgress,
    mut work: F,
) -> BatchReport
where
    F: FnMut(&str) -> Result<String, SyncError>,
{
    let total = items.len();
    let budget = TimeBudget::start(budget);
    let mut report = BatchReport::new(stage, total);

    for (index, name) in items.iter().enumerate() {
        if budget.exhausted() {
            info!(
                %stage,
                budget_secs = budget.limit.as_secs(),
                "time budget reached, stopping with {} item(s) left",
                total - index
            );
            report.stopped = Some(StopReason::BudgetExhausted);
            report.remaining.extend_from_slice(&items[index..]);
            break;
        }

        progress.on_start(stage, name, index, total);
        let started = Instant::now();
        let result = work(name);
        let elapsed = started.elapsed();

        match result {
            Ok(location) => {
                progress.on_complete(stage, name, index, total, elapsed, Ok(&location));
                report.completed.push(CompletedItem {
                    name: name.clone(),
                    location,
                });
            }
            Err(error) => {
                progress.on_complete(stage, name, index, total, elapsed, Err(&error));
                report.remaining.push(name.clone());
                report.failures.push(ItemFailure {
                    name: name.clone(),
                    error,
                });
                if policy == FailurePolicy::AbortBatch {
                    warn!(%stage, "aborting batch at {name}");
                    report.stopped = Some(StopReason::Aborted { at: name.clone() });
                    report.remaining.extend_from_slice(&items[index + 1..]);
                    break;
                }
            }
        }
    }

    progress.on_batch_complete(&report);
    report
}

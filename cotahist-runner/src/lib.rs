//! COTAHIST runner: reconciliation and time-boxed synchronization.
//!
//! This crate builds on `cotahist-core` to provide:
//! - Run configuration loaded from TOML
//! - Reconciliation of the remote catalog against local storage
//! - Time-boxed download and conversion batches with an explicit failure policy
//! - Cleanup of superseded monthly and daily artifacts
//! - The end-to-end `sync_series` / `sync_parquets` / `sync_all` runs

pub mod batch;
pub mod cleanup;
pub mod config;
pub mod convert;
pub mod download;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod reconcile;

pub use batch::{run_batch, BatchReport, CompletedItem, ItemFailure, StopReason, TimeBudget};
pub use cleanup::cleanup;
pub use config::{ConfigError, FailurePolicy, SyncConfig};
pub use convert::{convert, missing_conversions};
pub use download::download;
pub use error::SyncError;
pub use pipeline::{dry_run, sync_all, sync_parquets, sync_series, SeriesReport, SyncAllReport};
pub use progress::{SilentProgress, Stage, SyncProgress, TracingProgress};
pub use reconcile::{plan, LocalCatalog, PlannedArtifact};

//! Orchestrator error taxonomy.

use cotahist_core::decode::DecodeError;
use cotahist_core::source::SourceError;
use cotahist_core::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Fatal for the run: no plan is produced without a catalog.
    #[error("remote catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("fetch of '{file_name}' failed: {reason}")]
    FetchFailed { file_name: String, reason: String },

    #[error("decoding '{artifact}' failed: {source}")]
    DecodeFailed {
        artifact: String,
        #[source]
        source: DecodeError,
    },

    #[error("storage {op} of '{name}' failed: {reason}")]
    StorageFailed {
        op: &'static str,
        name: String,
        reason: String,
    },
}

impl SyncError {
    pub(crate) fn decode(artifact: &str, source: DecodeError) -> Self {
        SyncError::DecodeFailed {
            artifact: artifact.to_string(),
            source,
        }
    }

    /// Attach the operation and artifact to a storage failure.
    pub(crate) fn storage(op: &'static str, name: &str, err: StorageError) -> Self {
        SyncError::StorageFailed {
            op,
            name: name.to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<SourceError> for SyncError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::CatalogUnavailable(reason) => SyncError::CatalogUnavailable(reason),
            SourceError::FetchFailed { file_name, reason } => {
                SyncError::FetchFailed { file_name, reason }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_errors_map_onto_sync_errors() {
        let err: SyncError = SourceError::FetchFailed {
            file_name: "COTAHIST_A2000.ZIP".into(),
            reason: "HTTP 404".into(),
        }
        .into();
        assert!(matches!(err, SyncError::FetchFailed { ref file_name, .. } if file_name == "COTAHIST_A2000.ZIP"));

        let err: SyncError = SourceError::CatalogUnavailable("timeout".into()).into();
        assert!(matches!(err, SyncError::CatalogUnavailable(_)));
    }

    #[test]
    fn decode_failure_names_the_artifact_and_cause() {
        let err = SyncError::decode("COTAHIST_A2000.ZIP", DecodeError::EntryCount(2));
        let message = err.to_string();
        assert!(message.contains("COTAHIST_A2000.ZIP"));
        assert!(message.contains("exactly one file"));
    }

    #[test]
    fn storage_failure_names_the_operation() {
        let err = SyncError::storage(
            "write",
            "COTAHIST_A2000.parquet",
            StorageError::Backend("bucket gone".into()),
        );
        assert_eq!(
            err.to_string(),
            "storage write of 'COTAHIST_A2000.parquet' failed: storage backend error: bucket gone"
        );
    }
}

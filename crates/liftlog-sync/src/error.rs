use liftlog_shared::AnonymizeError;
use liftlog_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the sync engine.
///
/// Transport failures never appear here: they are absorbed by the per-item
/// retry state machine and show up as queue state instead.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Building the anonymized payload failed; nothing was queued.
    #[error("Anonymization failed: {0}")]
    Anonymize(#[from] AnonymizeError),

    /// The local store rejected a read or write.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

//! The sync engine: enqueue, per-item retry state machine, queue drain and
//! failed-item recovery.
//!
//! Items move `pending -> processing -> deleted` on success, or back to
//! `pending` (under the retry limit) / on to `failed` (limit reached) on
//! failure.  A failed attempt never loses the item.  `failed` is left only
//! by an explicit [`SyncEngine::retry_failed`].
//!
//! Settings are re-read from the store at every use, so a toggle flipped in
//! the UI takes effect on the next operation without restarting anything.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use liftlog_shared::{anonymize, BodyProfile, WorkoutRecord};
use liftlog_store::{
    Database, QueueCounts, QueueItem, QueueStatus, StoreError, SyncSettings, SyncSettingsUpdate,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::transport::Transport;

/// What happened to a single queue item during processing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProcessOutcome {
    /// Transmitted and removed from the queue.
    Sent,
    /// Send failed; the item went back to `pending` for a later drain.
    Requeued,
    /// Send failed and the retry limit was reached; the item is `failed`.
    Failed,
    /// The item vanished before or during processing (benign race).
    Missing,
}

/// Counts returned by one drain pass.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DrainReport {
    /// Items a send was attempted for.
    pub processed: u32,
    /// Items that were transmitted and removed.
    pub succeeded: u32,
}

/// Orchestrates the anonymized-data queue against the transport.
pub struct SyncEngine {
    db: Arc<Mutex<Database>>,
    transport: Arc<dyn Transport>,
    /// Single-flight gate: only one drain pass runs at a time.
    draining: AtomicBool,
}

impl SyncEngine {
    pub fn new(db: Arc<Mutex<Database>>, transport: Arc<dyn Transport>) -> Self {
        Self {
            db,
            transport,
            draining: AtomicBool::new(false),
        }
    }

    // ------------------------------------------------------------------
    // Settings surface
    // ------------------------------------------------------------------

    /// Current sync settings, read fresh from the store.
    pub async fn settings(&self) -> Result<SyncSettings, SyncError> {
        let db = self.db.lock().await;
        Ok(db.sync_settings()?)
    }

    /// Apply a partial settings update and return the merged result.
    pub async fn apply_settings(
        &self,
        update: &SyncSettingsUpdate,
    ) -> Result<SyncSettings, SyncError> {
        let db = self.db.lock().await;
        Ok(db.update_sync_settings(update)?)
    }

    /// Toggle anonymized data sharing.
    pub async fn set_sharing_enabled(&self, enabled: bool) -> Result<SyncSettings, SyncError> {
        self.apply_settings(&SyncSettingsUpdate {
            enabled: Some(enabled),
            ..Default::default()
        })
        .await
    }

    /// Toggle the background sync loop for future [`start_background`] calls.
    ///
    /// [`start_background`]: SyncEngine::start_background
    pub async fn set_auto_sync(&self, auto_sync: bool) -> Result<SyncSettings, SyncError> {
        self.apply_settings(&SyncSettingsUpdate {
            auto_sync: Some(auto_sync),
            ..Default::default()
        })
        .await
    }

    // ------------------------------------------------------------------
    // Queue inspection
    // ------------------------------------------------------------------

    /// Per-status queue tallies.
    pub async fn queue_counts(&self) -> Result<QueueCounts, SyncError> {
        let db = self.db.lock().await;
        Ok(db.queue_counts()?)
    }

    /// Queue items with the given status, in insertion order.
    pub async fn queue_items(&self, status: QueueStatus) -> Result<Vec<QueueItem>, SyncError> {
        let db = self.db.lock().await;
        Ok(db.queue_items_by_status(status)?)
    }

    // ------------------------------------------------------------------
    // Enqueue
    // ------------------------------------------------------------------

    /// Anonymize the given records and park the payload in the queue.
    ///
    /// Returns `Ok(None)` without doing any anonymization work when data
    /// sharing is disabled.  On error nothing is queued.
    pub async fn queue(
        &self,
        identifier: &str,
        profile: &BodyProfile,
        records: &[WorkoutRecord],
    ) -> Result<Option<QueueItem>, SyncError> {
        let settings = self.settings().await?;
        if !settings.enabled {
            debug!("data sharing disabled, nothing queued");
            return Ok(None);
        }

        let payload = anonymize::build_payload(identifier, profile, records)?;

        let item = {
            let db = self.db.lock().await;
            db.enqueue_payload(&payload)?
        };

        info!(
            item_id = item.id,
            workouts = item.payload.workouts.len(),
            "anonymized payload queued"
        );
        Ok(Some(item))
    }

    // ------------------------------------------------------------------
    // Processing
    // ------------------------------------------------------------------

    /// Attempt to transmit a single queue item.
    ///
    /// A vanished item (processed or deleted concurrently) is a benign
    /// [`ProcessOutcome::Missing`], not an error.  Transport failures become
    /// queue-state transitions; only store failures propagate as `Err`.
    pub async fn process_one(&self, item_id: i64) -> Result<ProcessOutcome, SyncError> {
        let item = {
            let db = self.db.lock().await;
            match db.queue_item(item_id) {
                Ok(item) => item,
                Err(StoreError::NotFound) => {
                    debug!(item_id, "queue item vanished before processing");
                    return Ok(ProcessOutcome::Missing);
                }
                Err(e) => return Err(e.into()),
            }
        };

        {
            let db = self.db.lock().await;
            if !db.mark_queue_item_processing(item_id)? {
                debug!(item_id, "queue item vanished before processing");
                return Ok(ProcessOutcome::Missing);
            }
        }

        // Never transmit a payload that fails the structural self-check.
        let send_result = if anonymize::validate_payload(&item.payload) {
            self.transport
                .send(&item.payload)
                .await
                .map_err(|e| e.to_string())
        } else {
            Err("payload failed structural validation".to_string())
        };

        match send_result {
            Ok(()) => {
                let db = self.db.lock().await;
                if !db.delete_queue_item(item_id)? {
                    debug!(item_id, "queue item already removed after send");
                }
                info!(item_id, "queue item transmitted");
                Ok(ProcessOutcome::Sent)
            }
            Err(message) => self.record_failure(item_id, &message).await,
        }
    }

    /// Bump the retry count after a failed attempt and park the item as
    /// `pending` or `failed` depending on the limit.
    async fn record_failure(
        &self,
        item_id: i64,
        message: &str,
    ) -> Result<ProcessOutcome, SyncError> {
        let settings = self.settings().await?;

        let db = self.db.lock().await;
        let current = match db.queue_item(item_id) {
            Ok(item) => item,
            Err(StoreError::NotFound) => {
                debug!(item_id, "queue item vanished during send");
                return Ok(ProcessOutcome::Missing);
            }
            Err(e) => return Err(e.into()),
        };

        let retry_count = current.retry_count + 1;
        if retry_count >= settings.max_retries {
            db.update_queue_item_state(item_id, QueueStatus::Failed, retry_count, Some(message))?;
            warn!(
                item_id,
                retry_count,
                error = message,
                "retry limit reached, queue item marked failed"
            );
            Ok(ProcessOutcome::Failed)
        } else {
            db.update_queue_item_state(item_id, QueueStatus::Pending, retry_count, Some(message))?;
            warn!(item_id, retry_count, error = message, "send failed, item requeued");
            Ok(ProcessOutcome::Requeued)
        }
    }

    /// Attempt to transmit every currently pending item, one at a time.
    ///
    /// Takes a snapshot of the pending set up front; items requeued during
    /// the pass wait for the next drain, which bounds the pass.  Between
    /// items (not after the last) the configured delay is inserted to avoid
    /// bursting the transport.  A second drain started while one is running
    /// returns an empty report immediately.
    pub async fn drain(&self) -> Result<DrainReport, SyncError> {
        let settings = self.settings().await?;
        if !settings.enabled {
            debug!("data sharing disabled, skipping drain");
            return Ok(DrainReport::default());
        }

        if self
            .draining
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("drain already in progress, skipping");
            return Ok(DrainReport::default());
        }

        let result = self.drain_snapshot(&settings).await;
        self.draining.store(false, Ordering::SeqCst);
        result
    }

    async fn drain_snapshot(&self, settings: &SyncSettings) -> Result<DrainReport, SyncError> {
        let pending = {
            let db = self.db.lock().await;
            db.queue_items_by_status(QueueStatus::Pending)?
        };

        if pending.is_empty() {
            return Ok(DrainReport::default());
        }

        info!(items = pending.len(), "draining sync queue");

        let mut report = DrainReport::default();
        for (index, item) in pending.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(Duration::from_millis(settings.retry_delay_ms)).await;
            }
            report.processed += 1;
            if matches!(self.process_one(item.id).await?, ProcessOutcome::Sent) {
                report.succeeded += 1;
            }
        }

        info!(
            processed = report.processed,
            succeeded = report.succeeded,
            "drain finished"
        );
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Recovery
    // ------------------------------------------------------------------

    /// Reset every `failed` item to `pending` with a cleared retry count.
    ///
    /// Returns how many items were reset.  Does not trigger a drain.
    pub async fn retry_failed(&self) -> Result<usize, SyncError> {
        let db = self.db.lock().await;
        let failed = db.queue_items_by_status(QueueStatus::Failed)?;

        for item in &failed {
            db.update_queue_item_state(item.id, QueueStatus::Pending, 0, None)?;
        }

        if !failed.is_empty() {
            info!(count = failed.len(), "failed queue items reset for retry");
        }
        Ok(failed.len())
    }

    /// Flip `processing` leftovers from an interrupted run back to `pending`.
    ///
    /// Call once at application startup, before the first drain.  Sends are
    /// not exactly-once from the backend's perspective, so re-sending an
    /// item whose acknowledgement was lost is acceptable.
    pub async fn recover_interrupted(&self) -> Result<usize, SyncError> {
        let recovered = {
            let db = self.db.lock().await;
            db.recover_interrupted_items()?
        };

        if recovered > 0 {
            warn!(recovered, "recovered queue items left mid-send by a previous run");
        }
        Ok(recovered)
    }
}

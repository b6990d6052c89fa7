//! Records persisted by the sync core.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the UI layer over IPC.

use chrono::{DateTime, Utc};
use liftlog_shared::AnonymousDataPayload;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

/// Where a queue item sits in its retry lifecycle.
///
/// Successful transmission deletes the row instead of adding a status, so
/// there is no terminal "sent" variant.  `Processing` exists only while a
/// send is in flight; anything left in that state after a crash is flipped
/// back to `Pending` on startup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Pending,
    Processing,
    Failed,
}

impl QueueStatus {
    /// Text form persisted in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Processing => "processing",
            QueueStatus::Failed => "failed",
        }
    }

    /// Parse the persisted text form.
    pub fn parse(s: &str) -> Result<Self, StoreError> {
        match s {
            "pending" => Ok(QueueStatus::Pending),
            "processing" => Ok(QueueStatus::Processing),
            "failed" => Ok(QueueStatus::Failed),
            other => Err(StoreError::UnknownStatus(other.to_string())),
        }
    }
}

/// One pending unit of anonymized data awaiting transmission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueItem {
    /// Row id assigned by SQLite on insert.
    pub id: i64,
    /// When the item was enqueued.  Immutable.
    pub created_at: DateTime<Utc>,
    /// Current lifecycle state.
    pub status: QueueStatus,
    /// The anonymized payload.  Immutable after enqueue.
    pub payload: AnonymousDataPayload,
    /// Number of failed send attempts so far.
    pub retry_count: u32,
    /// Message from the most recent failed attempt, if any.
    pub last_error: Option<String>,
}

/// Per-status tallies for the queue inspection view.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueCounts {
    pub pending: u32,
    pub processing: u32,
    pub failed: u32,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Sync configuration, persisted as a single JSON row.
///
/// Missing fields in the stored JSON are filled from the defaults, so
/// settings written by an older version keep working after an upgrade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncSettings {
    /// Whether anonymized data sharing is enabled at all.
    pub enabled: bool,
    /// Whether the background sync loop should run.
    pub auto_sync: bool,
    /// Failed attempts after which an item stops being retried.
    pub max_retries: u32,
    /// Delay in milliseconds between items within one drain pass.
    pub retry_delay_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            // Sharing is opt-in.
            enabled: false,
            auto_sync: false,
            max_retries: 3,
            retry_delay_ms: 5000,
        }
    }
}

/// Partial settings update: `None` fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettingsUpdate {
    pub enabled: Option<bool>,
    pub auto_sync: Option<bool>,
    pub max_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

impl SyncSettings {
    /// Apply a partial update on top of these settings.
    pub fn merged(mut self, update: &SyncSettingsUpdate) -> Self {
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(auto_sync) = update.auto_sync {
            self.auto_sync = auto_sync;
        }
        if let Some(max_retries) = update.max_retries {
            self.max_retries = max_retries;
        }
        if let Some(retry_delay_ms) = update.retry_delay_ms {
            self.retry_delay_ms = retry_delay_ms;
        }
        self
    }
}

//! CRUD operations for [`QueueItem`] records.
//!
//! The queue table is the single source of truth for sync state: the engine
//! re-reads it before every decision and never caches items in memory.

use chrono::{DateTime, Utc};
use liftlog_shared::AnonymousDataPayload;
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{QueueCounts, QueueItem, QueueStatus};

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new `pending` queue item and return it with its assigned id.
    pub fn enqueue_payload(&self, payload: &AnonymousDataPayload) -> Result<QueueItem> {
        let created_at = Utc::now();
        let payload_json = serde_json::to_string(payload)?;

        self.conn().execute(
            "INSERT INTO sync_queue (created_at, status, payload, retry_count)
             VALUES (?1, 'pending', ?2, 0)",
            params![created_at.to_rfc3339(), payload_json],
        )?;

        let id = self.conn().last_insert_rowid();

        Ok(QueueItem {
            id,
            created_at,
            status: QueueStatus::Pending,
            payload: payload.clone(),
            retry_count: 0,
            last_error: None,
        })
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single queue item by id.
    pub fn queue_item(&self, id: i64) -> Result<QueueItem> {
        self.conn()
            .query_row(
                "SELECT id, created_at, status, payload, retry_count, last_error
                 FROM sync_queue
                 WHERE id = ?1",
                params![id],
                row_to_queue_item,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List all items with the given status, in insertion order.
    pub fn queue_items_by_status(&self, status: QueueStatus) -> Result<Vec<QueueItem>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, created_at, status, payload, retry_count, last_error
             FROM sync_queue
             WHERE status = ?1
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![status.as_str()], row_to_queue_item)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    /// Per-status tallies for the queue inspection view.
    pub fn queue_counts(&self) -> Result<QueueCounts> {
        let mut stmt = self
            .conn()
            .prepare("SELECT status, COUNT(*) FROM sync_queue GROUP BY status")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
        })?;

        let mut counts = QueueCounts::default();
        for row in rows {
            let (status, count) = row?;
            match QueueStatus::parse(&status)? {
                QueueStatus::Pending => counts.pending = count,
                QueueStatus::Processing => counts.processing = count,
                QueueStatus::Failed => counts.failed = count,
            }
        }
        Ok(counts)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Mark an item `processing` ahead of a send attempt.
    ///
    /// Returns `false` if the row no longer exists -- a concurrent actor may
    /// have deleted it between enumeration and processing.
    pub fn mark_queue_item_processing(&self, id: i64) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE sync_queue SET status = 'processing' WHERE id = ?1",
            params![id],
        )?;
        Ok(affected > 0)
    }

    /// Record the outcome of a failed send attempt, or a manual reset.
    pub fn update_queue_item_state(
        &self,
        id: i64,
        status: QueueStatus,
        retry_count: u32,
        last_error: Option<&str>,
    ) -> Result<()> {
        self.conn().execute(
            "UPDATE sync_queue
             SET status = ?2, retry_count = ?3, last_error = ?4
             WHERE id = ?1",
            params![id, status.as_str(), retry_count, last_error],
        )?;
        Ok(())
    }

    /// Flip any `processing` leftovers from an interrupted run back to
    /// `pending`.  Returns how many rows were recovered.
    pub fn recover_interrupted_items(&self) -> Result<usize> {
        let affected = self.conn().execute(
            "UPDATE sync_queue SET status = 'pending' WHERE status = 'processing'",
            [],
        )?;
        Ok(affected)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a queue item.  Returns whether a row was actually removed.
    pub fn delete_queue_item(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM sync_queue WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

fn row_to_queue_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<QueueItem> {
    let id: i64 = row.get(0)?;
    let created_str: String = row.get(1)?;
    let status_str: String = row.get(2)?;
    let payload_json: String = row.get(3)?;
    let retry_count: u32 = row.get(4)?;
    let last_error: Option<String> = row.get(5)?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let status = QueueStatus::parse(&status_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let payload: AnonymousDataPayload = serde_json::from_str(&payload_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(QueueItem {
        id,
        created_at,
        status,
        payload,
        retry_count,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftlog_shared::{AnonymousWorkout, ProfileSummary};

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    fn sample_payload(marker: &str) -> AnonymousDataPayload {
        AnonymousDataPayload {
            profile_hash: "ab".repeat(32),
            profile: ProfileSummary {
                height: 180.0,
                weight: 80.0,
                weekly_frequency: 3,
            },
            workouts: vec![AnonymousWorkout {
                date: "2025-06-01T18:30:00+00:00".into(),
                body_part: marker.into(),
                exercise_name: "squat".into(),
                max_weight: 120.0,
                total_reps: 15,
                total_sets: 3,
            }],
        }
    }

    #[test]
    fn enqueue_assigns_id_and_defaults() {
        let (_dir, db) = test_db();
        let item = db.enqueue_payload(&sample_payload("legs")).unwrap();

        assert!(item.id > 0);
        assert_eq!(item.status, QueueStatus::Pending);
        assert_eq!(item.retry_count, 0);
        assert!(item.last_error.is_none());

        let stored = db.queue_item(item.id).unwrap();
        assert_eq!(stored, item);
    }

    #[test]
    fn items_listed_in_insertion_order() {
        let (_dir, db) = test_db();
        let first = db.enqueue_payload(&sample_payload("legs")).unwrap();
        let second = db.enqueue_payload(&sample_payload("back")).unwrap();

        let pending = db.queue_items_by_status(QueueStatus::Pending).unwrap();
        assert_eq!(
            pending.iter().map(|i| i.id).collect::<Vec<_>>(),
            vec![first.id, second.id]
        );
    }

    #[test]
    fn state_update_round_trip() {
        let (_dir, db) = test_db();
        let item = db.enqueue_payload(&sample_payload("legs")).unwrap();

        db.update_queue_item_state(item.id, QueueStatus::Failed, 3, Some("HTTP 503"))
            .unwrap();

        let stored = db.queue_item(item.id).unwrap();
        assert_eq!(stored.status, QueueStatus::Failed);
        assert_eq!(stored.retry_count, 3);
        assert_eq!(stored.last_error.as_deref(), Some("HTTP 503"));
        assert_eq!(stored.payload, item.payload);
    }

    #[test]
    fn missing_item_is_not_found() {
        let (_dir, db) = test_db();
        assert!(matches!(db.queue_item(999), Err(StoreError::NotFound)));
    }

    #[test]
    fn mark_processing_reports_vanished_rows() {
        let (_dir, db) = test_db();
        let item = db.enqueue_payload(&sample_payload("legs")).unwrap();

        assert!(db.mark_queue_item_processing(item.id).unwrap());
        assert!(db.delete_queue_item(item.id).unwrap());
        assert!(!db.mark_queue_item_processing(item.id).unwrap());
        assert!(!db.delete_queue_item(item.id).unwrap());
    }

    #[test]
    fn recover_flips_processing_to_pending() {
        let (_dir, db) = test_db();
        let a = db.enqueue_payload(&sample_payload("legs")).unwrap();
        let b = db.enqueue_payload(&sample_payload("back")).unwrap();
        db.mark_queue_item_processing(a.id).unwrap();
        db.mark_queue_item_processing(b.id).unwrap();

        assert_eq!(db.recover_interrupted_items().unwrap(), 2);
        assert_eq!(db.recover_interrupted_items().unwrap(), 0);

        let pending = db.queue_items_by_status(QueueStatus::Pending).unwrap();
        assert_eq!(pending.len(), 2);
    }

    #[test]
    fn counts_by_status() {
        let (_dir, db) = test_db();
        let a = db.enqueue_payload(&sample_payload("legs")).unwrap();
        db.enqueue_payload(&sample_payload("back")).unwrap();
        db.update_queue_item_state(a.id, QueueStatus::Failed, 3, Some("timeout"))
            .unwrap();

        let counts = db.queue_counts().unwrap();
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.processing, 0);
        assert_eq!(counts.failed, 1);
    }
}

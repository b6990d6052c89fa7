//! Persistence for the single-row [`SyncSettings`] document.
//!
//! Settings are read fresh on every access and written back whole; partial
//! updates go through read-modify-write so concurrent writers cannot clear
//! each other's fields.

use rusqlite::params;

use crate::database::Database;
use crate::error::Result;
use crate::models::{SyncSettings, SyncSettingsUpdate};

impl Database {
    /// Read the current sync settings.
    ///
    /// A missing row yields the defaults.  A row that no longer parses (e.g.
    /// written by a corrupted shutdown) also yields the defaults, with a
    /// warning, so sync keeps working rather than failing permanently.
    pub fn sync_settings(&self) -> Result<SyncSettings> {
        let stored: Option<String> = self
            .conn()
            .query_row("SELECT json FROM sync_settings WHERE id = 1", [], |row| {
                row.get(0)
            })
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        let Some(json) = stored else {
            return Ok(SyncSettings::default());
        };

        match serde_json::from_str(&json) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!(error = %e, "stored sync settings unreadable, using defaults");
                Ok(SyncSettings::default())
            }
        }
    }

    /// Apply a partial update and persist the merged settings.
    ///
    /// Returns the settings as stored after the write.
    pub fn update_sync_settings(&self, update: &SyncSettingsUpdate) -> Result<SyncSettings> {
        let merged = self.sync_settings()?.merged(update);
        let json = serde_json::to_string(&merged)?;

        self.conn().execute(
            "INSERT INTO sync_settings (id, json) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET json = excluded.json",
            params![json],
        )?;

        tracing::debug!(
            enabled = merged.enabled,
            auto_sync = merged.auto_sync,
            max_retries = merged.max_retries,
            "sync settings updated"
        );

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn first_read_yields_defaults() {
        let (_dir, db) = test_db();
        assert_eq!(db.sync_settings().unwrap(), SyncSettings::default());
    }

    #[test]
    fn partial_update_merges_and_persists() {
        let (_dir, db) = test_db();

        db.update_sync_settings(&SyncSettingsUpdate {
            enabled: Some(true),
            ..Default::default()
        })
        .unwrap();

        let after = db
            .update_sync_settings(&SyncSettingsUpdate {
                max_retries: Some(5),
                ..Default::default()
            })
            .unwrap();

        assert!(after.enabled);
        assert_eq!(after.max_retries, 5);
        assert_eq!(after.retry_delay_ms, 5000);
        assert_eq!(db.sync_settings().unwrap(), after);
    }

    #[test]
    fn corrupt_row_falls_back_to_defaults() {
        let (_dir, db) = test_db();
        db.conn()
            .execute(
                "INSERT INTO sync_settings (id, json) VALUES (1, 'not json')",
                [],
            )
            .unwrap();

        assert_eq!(db.sync_settings().unwrap(), SyncSettings::default());
    }
}

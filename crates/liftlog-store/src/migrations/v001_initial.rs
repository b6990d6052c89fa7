//! v001 -- Initial schema creation.
//!
//! Creates the two sync-core tables: `sync_queue` and `sync_settings`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Sync queue
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS sync_queue (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at  TEXT NOT NULL,                     -- ISO-8601 / RFC-3339
    status      TEXT NOT NULL DEFAULT 'pending',   -- pending | processing | failed
    payload     TEXT NOT NULL,                     -- AnonymousDataPayload JSON
    retry_count INTEGER NOT NULL DEFAULT 0,
    last_error  TEXT
);

CREATE INDEX IF NOT EXISTS idx_sync_queue_status ON sync_queue(status);

-- ----------------------------------------------------------------
-- Sync settings (single JSON row)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS sync_settings (
    id   INTEGER PRIMARY KEY CHECK (id = 1),
    json TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}

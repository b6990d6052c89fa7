//! # liftlog-store
//!
//! Local persistent storage for the Liftlog sync pipeline, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed helpers for the two records the
//! sync core owns: the durable queue of anonymized payloads awaiting
//! transmission, and the single-row sync settings document.  The database is
//! the sole source of truth -- callers never mirror queue state in memory.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queue;
pub mod settings;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;

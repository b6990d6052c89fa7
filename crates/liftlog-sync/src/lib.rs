//! # liftlog-sync
//!
//! The offline-first sync pipeline behind Liftlog's anonymized data sharing.
//!
//! Payloads are anonymized on the way in (see `liftlog_shared::anonymize`),
//! parked in the durable queue owned by `liftlog-store`, and drained towards
//! the statistics backend one item at a time.  Failed sends move through a
//! bounded retry state machine (`pending -> processing -> pending | failed`);
//! `failed` items stay inspectable until the user resets them.  A background
//! loop can drive drains on an interval and is stoppable via its handle.
//!
//! The persisted queue is the single source of truth: every decision re-reads
//! it, so an interrupted run loses nothing and restarts cleanly after
//! [`SyncEngine::recover_interrupted`].

pub mod engine;
pub mod scheduler;
pub mod transport;

mod error;

pub use engine::{DrainReport, ProcessOutcome, SyncEngine};
pub use error::SyncError;
pub use scheduler::SyncTaskHandle;
pub use transport::{HttpTransport, Transport, TransportError};

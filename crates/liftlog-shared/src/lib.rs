//! # liftlog-shared
//!
//! Domain types shared between the Liftlog store, sync engine and UI layer,
//! plus the pure transforms that operate on them: the anonymizer that strips
//! identifying data before anything leaves the device, and the statistics
//! helpers behind the community-comparison views.
//!
//! Nothing in this crate performs I/O.

pub mod anonymize;
pub mod stats;
pub mod types;

mod error;

pub use error::{AnonymizeError, StatsError};
pub use types::*;

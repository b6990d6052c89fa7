//! Domain model structs shared across the workspace.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the UI layer over IPC.  The `Anonymous*` types are the only
//! ones that ever leave the device; they are serialized camelCase to match
//! the backend's wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Raw (local-only) records
// ---------------------------------------------------------------------------

/// The user's body profile as stored locally.
///
/// `name` and `goals` are identifying and never leave the device; only the
/// numeric fields are projected into the shared payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BodyProfile {
    /// Display name chosen by the user.
    pub name: String,
    /// Height in centimetres.
    pub height_cm: f64,
    /// Weight in kilograms.
    pub weight_kg: f64,
    /// Intended training sessions per week.
    pub weekly_frequency: u32,
    /// Free-text training goals.
    pub goals: Option<String>,
}

/// One set within a workout: weight lifted and repetitions performed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSet {
    /// Weight in kilograms.
    pub weight: f64,
    /// Repetitions performed.
    pub reps: u32,
}

/// A single recorded workout, as stored locally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutRecord {
    /// Local identifier of the user who recorded this workout.
    pub user_id: String,
    /// When the workout took place.
    pub date: DateTime<Utc>,
    /// Body part trained (e.g. "chest", "legs").
    pub body_part: String,
    /// Exercise name (e.g. "bench press").
    pub exercise_name: String,
    /// The sets performed, in order.
    pub sets: Vec<WorkoutSet>,
    /// Free-text notes.  Never shared.
    pub notes: Option<String>,
    /// Paths of photos attached to this workout.  Never shared.
    pub image_paths: Vec<String>,
}

// ---------------------------------------------------------------------------
// Anonymous (wire) types
// ---------------------------------------------------------------------------

/// Numeric projection of a [`BodyProfile`].  Flattened into
/// [`AnonymousDataPayload`] so the wire JSON stays flat.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    /// Height in centimetres.
    pub height: f64,
    /// Weight in kilograms.
    pub weight: f64,
    /// Training sessions per week.
    pub weekly_frequency: u32,
}

/// Per-workout aggregate with all identifying detail removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousWorkout {
    /// Workout date, RFC 3339 / ISO-8601.
    pub date: String,
    /// Body part trained.
    pub body_part: String,
    /// Exercise name.
    pub exercise_name: String,
    /// Maximum weight across the workout's sets (0 when there are no sets).
    pub max_weight: f64,
    /// Total repetitions across all sets.
    pub total_reps: u32,
    /// Number of sets performed.
    pub total_sets: u32,
}

/// The complete payload shared with the statistics backend.
///
/// Contains a one-way hash of the user identifier, the numeric profile
/// fields and the per-workout aggregates -- nothing else.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousDataPayload {
    /// SHA-256 digest of the raw user identifier, 64 lowercase hex chars.
    pub profile_hash: String,
    /// Numeric body profile fields.
    #[serde(flatten)]
    pub profile: ProfileSummary,
    /// Anonymized workout aggregates, in the order they were recorded.
    pub workouts: Vec<AnonymousWorkout>,
}

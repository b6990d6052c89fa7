//! One-way anonymization of local records into a shareable payload.
//!
//! The transform is pure: given the same identifier, profile and workouts it
//! always produces the same payload.  The identifier is replaced by its
//! SHA-256 digest; names, goals, notes, images and per-set detail are
//! dropped entirely.

use sha2::{Digest, Sha256};

use crate::error::AnonymizeError;
use crate::types::{
    AnonymousDataPayload, AnonymousWorkout, BodyProfile, ProfileSummary, WorkoutRecord,
};

/// Hash a raw user identifier into its 64-char lowercase hex digest.
///
/// Rejects empty or whitespace-only identifiers -- hashing those would
/// produce a stable, guessable digest shared by every misconfigured client.
pub fn hash_identifier(identifier: &str) -> Result<String, AnonymizeError> {
    if identifier.trim().is_empty() {
        return Err(AnonymizeError::EmptyIdentifier);
    }
    let digest = Sha256::digest(identifier.as_bytes());
    Ok(hex::encode(digest))
}

/// Reduce a workout record to its anonymous aggregate.
///
/// `max_weight` falls back to `0.0` for a record with no sets; the UI layer
/// does not create such records, but the transform stays total.
pub fn anonymize_workout(record: &WorkoutRecord) -> AnonymousWorkout {
    let max_weight = record
        .sets
        .iter()
        .map(|s| s.weight)
        .fold(0.0_f64, f64::max);
    let total_reps = record.sets.iter().map(|s| s.reps).sum();

    AnonymousWorkout {
        date: record.date.to_rfc3339(),
        body_part: record.body_part.clone(),
        exercise_name: record.exercise_name.clone(),
        max_weight,
        total_reps,
        total_sets: record.sets.len() as u32,
    }
}

/// Project the numeric fields out of a body profile.
pub fn anonymize_profile(profile: &BodyProfile) -> ProfileSummary {
    ProfileSummary {
        height: profile.height_cm,
        weight: profile.weight_kg,
        weekly_frequency: profile.weekly_frequency,
    }
}

/// Build the full payload for one user.
///
/// Only fails the way [`hash_identifier`] fails.
pub fn build_payload(
    identifier: &str,
    profile: &BodyProfile,
    records: &[WorkoutRecord],
) -> Result<AnonymousDataPayload, AnonymizeError> {
    let profile_hash = hash_identifier(identifier)?;

    Ok(AnonymousDataPayload {
        profile_hash,
        profile: anonymize_profile(profile),
        workouts: records.iter().map(anonymize_workout).collect(),
    })
}

/// Structural self-check run before a payload is transmitted.
///
/// Verifies the hash is exactly 64 lowercase hex characters, every workout
/// date parses as RFC 3339, and no weight is negative.
pub fn validate_payload(payload: &AnonymousDataPayload) -> bool {
    let hash_ok = payload.profile_hash.len() == 64
        && payload
            .profile_hash
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    if !hash_ok {
        return false;
    }

    payload.workouts.iter().all(|w| {
        chrono::DateTime::parse_from_rfc3339(&w.date).is_ok() && w.max_weight >= 0.0
    })
}

//! Statistics helpers for the community-comparison views.
//!
//! These operate on the aggregates that come back from the statistics
//! backend (e.g. max bench weight across all sharing users).  Inputs are
//! validated up front; malformed input is an immediate error, never a
//! silently wrong number.

use crate::error::StatsError;

fn checked(values: &[f64]) -> Result<(), StatsError> {
    if values.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
        return Err(StatsError::NonFinite(idx));
    }
    Ok(())
}

/// Arithmetic mean of the samples.
pub fn mean(values: &[f64]) -> Result<f64, StatsError> {
    checked(values)?;
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// The `pct`-th percentile of the samples, by linear interpolation between
/// closest ranks.  `pct` must lie in `[0, 100]`.
pub fn percentile(values: &[f64], pct: f64) -> Result<f64, StatsError> {
    checked(values)?;
    if !(0.0..=100.0).contains(&pct) {
        return Err(StatsError::InvalidPercentile(pct));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return Ok(sorted[lower]);
    }
    let fraction = rank - lower as f64;
    Ok(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Where `value` sits within the samples, as a percentage of samples less
/// than or equal to it.
pub fn percentile_rank(values: &[f64], value: f64) -> Result<f64, StatsError> {
    checked(values)?;
    if !value.is_finite() {
        return Err(StatsError::NonFinite(0));
    }

    let at_or_below = values.iter().filter(|v| **v <= value).count();
    Ok(at_or_below as f64 / values.len() as f64 * 100.0)
}

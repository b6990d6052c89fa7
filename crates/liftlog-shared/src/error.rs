use thiserror::Error;

/// Errors produced while anonymizing data for transmission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnonymizeError {
    /// The user identifier was empty or whitespace-only.
    #[error("Identifier must not be empty")]
    EmptyIdentifier,
}

/// Errors produced by the statistics helpers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    /// The input slice contained no samples.
    #[error("Statistic requires at least one sample")]
    EmptyInput,

    /// A sample was NaN or infinite.
    #[error("Sample at index {0} is not a finite number")]
    NonFinite(usize),

    /// The requested percentile was outside `[0, 100]`.
    #[error("Percentile {0} is outside the range 0..=100")]
    InvalidPercentile(f64),
}

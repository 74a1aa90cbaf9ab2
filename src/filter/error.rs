use thiserror::Error;

/// Validation failures raised while turning query parameters into a `Filter`.
/// All of them are the caller's fault; none is retryable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Invalid filter mode: {0} (expected one of eq, ne, gt, lt, in)")]
    InvalidFilterMode(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Invalid value for column {column}: {value:?} is not a valid {expected}")]
    InvalidFilterValue {
        column: String,
        value: String,
        expected: &'static str,
    },

    #[error("Missing filter value for column {0}")]
    MissingFilterValue(String),

    #[error("Too many values for column {column}: {count} exceeds maximum {max}")]
    TooManyValues { column: String, count: usize, max: usize },
}

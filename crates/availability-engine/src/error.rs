//! Error types for availability-engine operations.

use thiserror::Error;

/// Invalid or missing scheduling preferences.
///
/// Every variant carries a message the host can show verbatim next to the
/// offending preference.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("\"Working Hours Start Time\" is not specified.")]
    MissingStart,

    #[error("\"Working Hours End Time\" is not specified.")]
    MissingEnd,

    #[error("Unable to parse \"{0}\" into a time. Try \"h:mm AM\".")]
    UnparsableStart(String),

    #[error("Unable to parse \"{0}\" into a time. Try \"h:mm PM\".")]
    UnparsableEnd(String),

    #[error("\"Working Hours End Time\" must follow or match \"Working Hours Start Time\".")]
    EndBeforeStart,

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Malformed preferences: {0}")]
    Malformed(String),
}

/// Failure to read a wall-clock time of day.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeError {
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Time(#[from] TimeError),
}

pub type Result<T> = std::result::Result<T, EngineError>;

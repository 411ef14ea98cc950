//! Error types for the barks core library.
//!
//! Speech decisions never fail: a gating or resolver miss is a `false`
//! return, not an error. Errors only come from loading data.

use thiserror::Error;

/// Top-level error type for fallible barks operations.
#[derive(Error, Debug)]
pub enum BarksError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A schedule library refers to a schedule that does not exist.
    #[error("Unknown schedule: {0}")]
    UnknownSchedule(String),

    /// A schedule library is structurally invalid.
    #[error("Invalid schedule `{name}`: {reason}")]
    InvalidSchedule {
        /// Offending schedule.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, BarksError>;

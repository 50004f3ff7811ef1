//! Common types and utilities shared across Skyfeed crates.
//!
//! This crate defines the shared error type, process exit codes, and the
//! observability helpers used throughout the Skyfeed workspace. It is
//! intentionally lightweight so that every crate can depend on it.
//!
//! # Overview
//!
//! - [`SkyfeedError`] and [`Result`]: Shared error handling
//! - [`ExitCode`]: How each error class surfaces as a process status
//! - [`observability`]: Centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use skyfeed_common::{ExitCode, SkyfeedError};
//!
//! let err = SkyfeedError::Config("--days must be greater than 0".into());
//! assert_eq!(err.exit_code(), ExitCode::Config);
//! assert_eq!(ExitCode::Config.code(), 2);
//! ```

pub mod observability;

/// Process exit status for the `skyfeed` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    /// Transport, decode, or output failure during a run.
    Failure,
    /// Invalid settings detected before any network activity.
    Config,
}

impl ExitCode {
    pub fn code(self) -> u8 {
        match self {
            ExitCode::Success => 0,
            ExitCode::Failure => 1,
            ExitCode::Config => 2,
        }
    }
}

/// Error types used across the Skyfeed system.
#[derive(thiserror::Error, Debug)]
pub enum SkyfeedError {
    /// Settings were incomplete or invalid.
    #[error("{0}")]
    Config(String),

    /// A feed page could not be retrieved or decoded. Aborts the whole run.
    #[error("{0}")]
    Fetch(String),

    /// The output document could not be written.
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// The output document could not be serialized.
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SkyfeedError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            SkyfeedError::Config(_) => ExitCode::Config,
            SkyfeedError::Fetch(_) | SkyfeedError::Io(_) | SkyfeedError::Encode(_) => {
                ExitCode::Failure
            }
        }
    }
}

/// Convenient alias for results that use [`SkyfeedError`].
pub type Result<T> = std::result::Result<T, SkyfeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_and_fetch_errors_exit_differently() {
        let config = SkyfeedError::Config("bad".into());
        let fetch = SkyfeedError::Fetch("timed out".into());
        assert_eq!(config.exit_code().code(), 2);
        assert_eq!(fetch.exit_code().code(), 1);
        assert_ne!(config.exit_code(), fetch.exit_code());
    }

    #[test]
    fn io_errors_are_run_failures() {
        let err: SkyfeedError = std::io::Error::other("disk full").into();
        assert_eq!(err.exit_code(), ExitCode::Failure);
        assert!(err.to_string().contains("disk full"));
    }
}

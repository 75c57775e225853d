//! Error types for livesass
//!
//! Uses `thiserror` for library errors. Job-level failures (compile errors,
//! write errors) are *data* in [`crate::jobs::JobOutcome`], not `Err` values;
//! this enum covers configuration and orchestration faults only.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for livesass operations
pub type LivesassResult<T> = Result<T, LivesassError>;

/// Main error type for livesass operations
#[derive(Error, Debug)]
pub enum LivesassError {
    /// A segment-replacement value in a format was not a string
    #[error("invalid replacement for \"{key}\": the value must be a string, not {found}")]
    InvalidReplacement { key: String, found: String },

    /// Configuration file failed to parse
    #[error("invalid configuration in {file}: {message}")]
    InvalidConfig { file: PathBuf, message: String },

    /// `force_base_directory` does not point at a directory
    #[error("error with your force_base_directory setting \"{setting}\": not a directory: {path}")]
    BaseDirectoryInvalid { setting: String, path: PathBuf },

    /// Directory not found
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// A configured glob pattern failed to compile
    #[error("invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Filesystem watch subscription failure
    #[error("watch error: {0}")]
    Watch(String),
}

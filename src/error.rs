//! Error types for Ferry
//!
//! Uses `thiserror` for library errors. Nothing here is fatal to a watch
//! session: synchronization is best-effort and must never interrupt the
//! build that produces the artifacts.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Ferry operations
pub type FerryResult<T> = Result<T, FerryError>;

/// Main error type for Ferry operations
#[derive(Error, Debug)]
pub enum FerryError {
    /// Transport-level connect failure
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// A single artifact's put operation failed. Contained at the
    /// scheduler, logged, never retried.
    #[error("transfer failed for '{artifact}': {message}")]
    Transfer { artifact: String, message: String },

    /// Config file exists but could not be parsed
    #[error("invalid config file {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

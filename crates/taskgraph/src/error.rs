//! Error types for taskgraph operations.

use crate::domain::TaskId;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for taskgraph operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input failed validation before any graph work was done.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Task not found in the snapshot.
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// A snapshot file could not be read as a whole.
    #[error("Snapshot error in {}: {message}", path.display())]
    Snapshot {
        /// Path of the snapshot file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },
}

/// A specialized Result type for taskgraph operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for the taskgraph HTTP service.

use thiserror::Error;

/// Errors that stop the service from starting or running.
#[derive(Debug, Error)]
pub enum Error {
    /// The listener could not be bound.
    #[error("Failed to bind {addr}: {message}")]
    Bind {
        /// Requested address.
        addr: String,
        /// Reason reported by the listener.
        message: String,
    },

    /// An error from the taskgraph library (configuration, snapshot).
    #[error(transparent)]
    Taskgraph(#[from] taskgraph::error::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the HTTP service.
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for queue operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during queue operations
#[derive(Error, Debug)]
pub enum QueueError {
    /// File I/O error from a durable queue, including converter failures
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The queue has been closed and accepts no further operations
    #[error("queue is closed")]
    Closed,

    /// The operation needs at least one entry but the queue has none
    #[error("queue is empty")]
    Empty,

    /// An argument was rejected (e.g., removing more entries than present)
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Failed to acquire the queue file lock after multiple retries
    #[error("Failed to acquire lock on {path} after {retries} retries")]
    LockTimeout { path: PathBuf, retries: u32 },

    /// A queue operation panicked; the panic was caught and reported here
    #[error("queue operation panicked: {message}")]
    Fault { message: String },

    /// The worker thread could not be started
    #[error("failed to spawn queue worker: {0}")]
    Spawn(#[source] std::io::Error),
}

impl QueueError {
    /// Whether this failure came from the file system (or opening it).
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::LockTimeout { .. })
    }

    /// Whether this failure means the queue no longer accepts operations.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Whether the caller passed an argument the queue rejected.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

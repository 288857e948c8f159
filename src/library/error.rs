//! Error types for the media library collaborator.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from library transactions.
///
/// Read and write failures are kept distinct because callers report them
/// differently: a failed read aborts a scan, a failed write aborts a commit.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// A write transaction failed to commit.
    #[error("Library write transaction failed at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A read operation failed.
    #[error("Library read failed at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The catalog file exists but cannot be parsed.
    #[error("Corrupt library catalog: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Failed to join a blocking task.
    #[error("Failed to spawn blocking task: {0}")]
    Spawn(#[from] tokio::task::JoinError),
}

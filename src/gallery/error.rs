//! Error types for the write and erase paths.

use thiserror::Error;

use crate::library::LibraryError;
use crate::store::StoreError;

/// Errors from writing media into the library.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Reading the source file failed.
    #[error("Failed to read source file: {0}")]
    Io(#[from] std::io::Error),

    /// Decoding or encoding the image failed.
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),

    /// A library transaction failed.
    #[error(transparent)]
    Library(#[from] LibraryError),

    /// Persisting the local index failed.
    #[error(transparent)]
    Index(#[from] StoreError),

    /// Failed to join the blocking compositing task.
    #[error("Failed to spawn blocking task: {0}")]
    Spawn(#[from] tokio::task::JoinError),
}

/// Errors from the two deletion strategies.
#[derive(Debug, Error)]
pub enum EraseError {
    /// A library transaction failed.
    #[error(transparent)]
    Library(#[from] LibraryError),

    /// Persisting the local index failed.
    #[error(transparent)]
    Index(#[from] StoreError),
}

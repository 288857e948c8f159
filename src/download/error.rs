//! Error types for the download subsystem.

use thiserror::Error;

use super::kinds::SampleVideo;

/// Errors from starting or running a transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Another transfer already occupies the single active slot.
    #[error("A download of {active} is already in progress")]
    Busy { active: SampleVideo },

    /// The transport failed (connect, TLS, mid-stream).
    #[error("Transfer failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered outside the 2xx range.
    #[error("Unexpected HTTP status {status}")]
    Status { status: u16 },

    /// Writing or relocating the payload failed.
    #[error("Disk error: {0}")]
    Disk(#[from] std::io::Error),
}

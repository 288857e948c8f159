//! Shared media library collaborator.
//!
//! The library exposes four operations — import a resource, update metadata,
//! delete a set of entries, and read entries back — each wrapped in an atomic
//! transaction that either fully applies or fully fails. Everything the
//! writer and eraser guarantee is built on that atomicity; nothing in this
//! module retries.

pub mod error;
pub mod fs;

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use error::LibraryError;
pub use fs::FsMediaLibrary;

use crate::provenance::GeoTag;
use crate::types::MediaKind;

/// Opaque library-entry identifier.
pub type AssetId = String;

/// Payload source for an import.
#[derive(Debug, Clone)]
pub enum ImportPayload {
    /// Import the bytes of an existing file.
    File(PathBuf),
    /// Import in-memory bytes with the given file extension.
    Bytes { data: Vec<u8>, extension: String },
}

/// One import request: media kind, display name and payload.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub media: MediaKind,
    pub display_name: String,
    pub payload: ImportPayload,
}

impl ImportRequest {
    pub fn from_file(media: MediaKind, display_name: String, path: PathBuf) -> Self {
        Self {
            media,
            display_name,
            payload: ImportPayload::File(path),
        }
    }

    pub fn from_bytes(
        media: MediaKind,
        display_name: String,
        data: Vec<u8>,
        extension: &str,
    ) -> Self {
        Self {
            media,
            display_name,
            payload: ImportPayload::Bytes {
                data,
                extension: extension.to_string(),
            },
        }
    }
}

/// A library entry as seen by reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetEntry {
    pub id: AssetId,
    pub media: MediaKind,
    pub display_name: String,
    pub creation_date: DateTime<Utc>,
    pub location: Option<GeoTag>,
}

/// Object-safe async interface to the shared media library.
///
/// Usable as `Arc<dyn MediaLibrary>` across tasks.
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    /// Import a media resource. Returns the new entry's identifier.
    async fn import(&self, request: ImportRequest) -> Result<AssetId, LibraryError>;

    /// Set creation date and geotag on an existing entry in one transaction.
    ///
    /// Some backing stores issue a fresh placeholder identifier for the
    /// updated entry; when that happens it is returned and the caller must
    /// track it alongside the original. Unknown ids are a silent no-op.
    async fn update_metadata(
        &self,
        id: &str,
        creation_date: DateTime<Utc>,
        location: GeoTag,
    ) -> Result<Option<AssetId>, LibraryError>;

    /// Delete every listed entry in one transaction. Ids with no matching
    /// entry are silently skipped.
    async fn delete(&self, ids: &[AssetId]) -> Result<(), LibraryError>;

    /// Resolve ids to live entries; missing ids are silently skipped.
    async fn fetch_by_ids(&self, ids: &[AssetId]) -> Result<Vec<AssetEntry>, LibraryError>;

    /// Enumerate the entire library, unfiltered.
    async fn fetch_all(&self) -> Result<Vec<AssetEntry>, LibraryError>;
}

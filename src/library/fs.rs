//! Filesystem-backed media library.
//!
//! Layout under the library root:
//!
//! ```text
//! <root>/catalog.json      entry metadata
//! <root>/assets/<id>.<ext> one payload file per entry
//! ```
//!
//! Every operation is a transaction: read the catalog, mutate, write a temp
//! file, rename over the original. A crash leaves either the old or the new
//! catalog, never a torn one. Payload files are written before the catalog
//! commit and removed again if the commit fails.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::LibraryError;
use super::{AssetEntry, AssetId, ImportPayload, ImportRequest, MediaLibrary};
use crate::provenance::GeoTag;
use crate::types::MediaKind;

const CATALOG_FILE: &str = "catalog.json";
const ASSETS_DIR: &str = "assets";

/// On-disk form of one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AssetRecord {
    id: AssetId,
    media: MediaKind,
    display_name: String,
    creation_date: DateTime<Utc>,
    location: Option<GeoTag>,
    /// Payload filename relative to the assets directory.
    payload: String,
}

impl AssetRecord {
    fn to_entry(&self) -> AssetEntry {
        AssetEntry {
            id: self.id.clone(),
            media: self.media,
            display_name: self.display_name.clone(),
            creation_date: self.creation_date,
            location: self.location,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Catalog {
    entries: Vec<AssetRecord>,
}

struct Inner {
    root: PathBuf,
    /// Serializes transactions. Held across read-mutate-commit so two
    /// concurrent operations cannot interleave on the catalog file.
    lock: Mutex<()>,
}

/// Filesystem implementation of [`MediaLibrary`].
///
/// All blocking fs work runs under `spawn_blocking` so library transactions
/// never stall the async runtime.
#[derive(Clone)]
pub struct FsMediaLibrary {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for FsMediaLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsMediaLibrary")
            .field("root", &self.inner.root)
            .finish_non_exhaustive()
    }
}

impl FsMediaLibrary {
    /// Open (creating directories as needed) a library rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, LibraryError> {
        let root = root.into();
        fs::create_dir_all(root.join(ASSETS_DIR)).map_err(|e| LibraryError::Write {
            path: root.clone(),
            source: e,
        })?;
        Ok(Self {
            inner: Arc::new(Inner {
                root,
                lock: Mutex::new(()),
            }),
        })
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }
}

impl Inner {
    fn catalog_path(&self) -> PathBuf {
        self.root.join(CATALOG_FILE)
    }

    fn payload_path(&self, record: &AssetRecord) -> PathBuf {
        self.root.join(ASSETS_DIR).join(&record.payload)
    }

    fn read_catalog(&self) -> Result<Catalog, LibraryError> {
        let path = self.catalog_path();
        match fs::read_to_string(&path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Catalog::default()),
            Err(e) => Err(LibraryError::Read { path, source: e }),
        }
    }

    /// Commit point: temp write + rename.
    fn write_catalog(&self, catalog: &Catalog) -> Result<(), LibraryError> {
        let path = self.catalog_path();
        let write_err = |source| LibraryError::Write {
            path: self.catalog_path(),
            source,
        };
        let tmp = path.with_extension("json.tmp");
        let text = serde_json::to_string_pretty(catalog)?;
        fs::write(&tmp, text).map_err(write_err)?;
        fs::rename(&tmp, &path).map_err(write_err)?;
        Ok(())
    }

    fn import_blocking(&self, request: ImportRequest) -> Result<AssetId, LibraryError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let id = Uuid::new_v4().to_string();
        let extension = match &request.payload {
            ImportPayload::File(path) => path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or(match request.media {
                    MediaKind::Photo => "jpg",
                    MediaKind::Video => "mp4",
                })
                .to_string(),
            ImportPayload::Bytes { extension, .. } => extension.clone(),
        };
        let payload_name = format!("{id}.{extension}");
        let payload_path = self.root.join(ASSETS_DIR).join(&payload_name);

        match &request.payload {
            ImportPayload::File(source) => {
                fs::copy(source, &payload_path).map_err(|e| LibraryError::Write {
                    path: payload_path.clone(),
                    source: e,
                })?;
            }
            ImportPayload::Bytes { data, .. } => {
                fs::write(&payload_path, data).map_err(|e| LibraryError::Write {
                    path: payload_path.clone(),
                    source: e,
                })?;
            }
        }

        let mut catalog = self.read_catalog()?;
        catalog.entries.push(AssetRecord {
            id: id.clone(),
            media: request.media,
            display_name: request.display_name,
            creation_date: Utc::now(),
            location: None,
            payload: payload_name,
        });

        if let Err(e) = self.write_catalog(&catalog) {
            // Roll the payload back so a failed commit leaves no orphan file.
            let _ = fs::remove_file(&payload_path);
            return Err(e);
        }
        Ok(id)
    }

    fn update_metadata_blocking(
        &self,
        id: &str,
        creation_date: DateTime<Utc>,
        location: GeoTag,
    ) -> Result<Option<AssetId>, LibraryError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut catalog = self.read_catalog()?;
        let Some(record) = catalog.entries.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        record.creation_date = creation_date;
        record.location = Some(location);
        self.write_catalog(&catalog)?;
        // This store keeps identifiers stable across metadata updates, so no
        // placeholder id is ever issued here.
        Ok(None)
    }

    fn delete_blocking(&self, ids: &[AssetId]) -> Result<(), LibraryError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut catalog = self.read_catalog()?;
        let (removed, kept): (Vec<_>, Vec<_>) = catalog
            .entries
            .drain(..)
            .partition(|r| ids.contains(&r.id));
        catalog.entries = kept;
        self.write_catalog(&catalog)?;

        // Payloads go after the commit; a leftover payload file without a
        // catalog entry is invisible to reads.
        for record in &removed {
            let _ = fs::remove_file(self.payload_path(record));
        }
        Ok(())
    }

    fn fetch_by_ids_blocking(&self, ids: &[AssetId]) -> Result<Vec<AssetEntry>, LibraryError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let catalog = self.read_catalog()?;
        Ok(catalog
            .entries
            .iter()
            .filter(|r| ids.contains(&r.id))
            .map(AssetRecord::to_entry)
            .collect())
    }

    fn fetch_all_blocking(&self) -> Result<Vec<AssetEntry>, LibraryError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let catalog = self.read_catalog()?;
        Ok(catalog.entries.iter().map(AssetRecord::to_entry).collect())
    }
}

#[async_trait]
impl MediaLibrary for FsMediaLibrary {
    async fn import(&self, request: ImportRequest) -> Result<AssetId, LibraryError> {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || inner.import_blocking(request)).await?
    }

    async fn update_metadata(
        &self,
        id: &str,
        creation_date: DateTime<Utc>,
        location: GeoTag,
    ) -> Result<Option<AssetId>, LibraryError> {
        let inner = self.inner.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            inner.update_metadata_blocking(&id, creation_date, location)
        })
        .await?
    }

    async fn delete(&self, ids: &[AssetId]) -> Result<(), LibraryError> {
        let inner = self.inner.clone();
        let ids = ids.to_vec();
        tokio::task::spawn_blocking(move || inner.delete_blocking(&ids)).await?
    }

    async fn fetch_by_ids(&self, ids: &[AssetId]) -> Result<Vec<AssetEntry>, LibraryError> {
        let inner = self.inner.clone();
        let ids = ids.to_vec();
        tokio::task::spawn_blocking(move || inner.fetch_by_ids_blocking(&ids)).await?
    }

    async fn fetch_all(&self) -> Result<Vec<AssetEntry>, LibraryError> {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || inner.fetch_all_blocking()).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provenance;

    fn test_library(name: &str) -> FsMediaLibrary {
        let dir = std::env::temp_dir()
            .join("gallery_mocker_tests")
            .join("library")
            .join(name);
        let _ = fs::remove_dir_all(&dir);
        FsMediaLibrary::open(dir).unwrap()
    }

    fn photo_request(name: &str) -> ImportRequest {
        ImportRequest::from_bytes(
            MediaKind::Photo,
            name.to_string(),
            vec![0xFF, 0xD8, 0xFF],
            "jpg",
        )
    }

    #[tokio::test]
    async fn import_creates_entry_and_payload() {
        let lib = test_library("import");
        let id = lib.import(photo_request("one")).await.unwrap();

        let entries = lib.fetch_all().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, id);
        assert_eq!(entries[0].display_name, "one");
        assert!(entries[0].location.is_none());
        assert!(lib.root().join("assets").join(format!("{id}.jpg")).exists());
    }

    #[tokio::test]
    async fn import_from_file_copies_bytes() {
        let lib = test_library("import_file");
        let source = lib.root().join("source.png");
        fs::write(&source, b"png-bytes").unwrap();

        let id = lib
            .import(ImportRequest::from_file(
                MediaKind::Photo,
                "file".to_string(),
                source,
            ))
            .await
            .unwrap();
        let payload = lib.root().join("assets").join(format!("{id}.png"));
        assert_eq!(fs::read(payload).unwrap(), b"png-bytes");
    }

    #[tokio::test]
    async fn update_metadata_sets_date_and_tag() {
        let lib = test_library("update");
        let id = lib.import(photo_request("one")).await.unwrap();
        let date = Utc::now() - chrono::Duration::days(30);

        let placeholder = lib
            .update_metadata(&id, date, provenance::MARKER)
            .await
            .unwrap();
        assert!(placeholder.is_none());

        let entry = lib.fetch_by_ids(&[id]).await.unwrap().remove(0);
        assert_eq!(entry.creation_date, date);
        assert!(entry.location.unwrap().is_marker());
    }

    #[tokio::test]
    async fn update_metadata_unknown_id_is_noop() {
        let lib = test_library("update_unknown");
        let result = lib
            .update_metadata("missing", Utc::now(), provenance::MARKER)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn delete_removes_entries_and_payloads_and_skips_unknown() {
        let lib = test_library("delete");
        let a = lib.import(photo_request("a")).await.unwrap();
        let b = lib.import(photo_request("b")).await.unwrap();

        lib.delete(&[a.clone(), "missing".to_string()]).await.unwrap();

        let remaining = lib.fetch_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, b);
        assert!(!lib.root().join("assets").join(format!("{a}.jpg")).exists());
    }

    #[tokio::test]
    async fn fetch_by_ids_skips_missing() {
        let lib = test_library("fetch_by_ids");
        let a = lib.import(photo_request("a")).await.unwrap();
        let found = lib
            .fetch_by_ids(&[a.clone(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, a);
    }

    #[tokio::test]
    async fn catalog_survives_reopen() {
        let lib = test_library("reopen");
        let id = lib.import(photo_request("one")).await.unwrap();
        let root = lib.root().to_path_buf();
        drop(lib);

        let reopened = FsMediaLibrary::open(root).unwrap();
        let entries = reopened.fetch_all().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, id);
    }
}

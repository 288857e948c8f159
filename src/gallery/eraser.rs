//! Media eraser: two independent strategies for removing tool-created
//! entries from the library.
//!
//! The tracked strategy trusts the local index; the scan strategy trusts the
//! provenance marker and works even when the index was lost (reinstall). The
//! caller picks one per invocation; neither strategy invokes the other, and
//! both clear the index unconditionally on success.

use std::sync::Arc;

use super::error::EraseError;
use crate::library::{AssetId, MediaLibrary};
use crate::store::LocalIndex;

pub struct MediaEraser {
    library: Arc<dyn MediaLibrary>,
    index: LocalIndex,
}

impl MediaEraser {
    pub fn new(library: Arc<dyn MediaLibrary>, index: LocalIndex) -> Self {
        Self { library, index }
    }

    /// Delete every library entry the index tracks. Identifiers that no
    /// longer resolve to a live entry are silently skipped. Returns the
    /// number of entries deleted.
    pub async fn delete_tracked(&self) -> Result<usize, EraseError> {
        let tracked = self.index.load()?;
        let resolved: Vec<AssetId> = self
            .library
            .fetch_by_ids(&tracked)
            .await?
            .into_iter()
            .map(|entry| entry.id)
            .collect();

        self.library.delete(&resolved).await?;
        // Unconditional, even when nothing resolved: a cleared index is the
        // postcondition of the strategy, not a side effect of deleting.
        self.index.clear()?;
        Ok(resolved.len())
    }

    /// Full-library scan for entries whose geotag is the provenance marker,
    /// deleted in one transaction. The recovery path for a lost index;
    /// deliberately slower and never run automatically.
    pub async fn delete_by_provenance_scan(&self) -> Result<usize, EraseError> {
        let matched: Vec<AssetId> = self
            .library
            .fetch_all()
            .await?
            .into_iter()
            .filter(|entry| entry.location.is_some_and(|tag| tag.is_marker()))
            .map(|entry| entry.id)
            .collect();

        self.library.delete(&matched).await?;
        self.index.clear()?;
        Ok(matched.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::fs;
    use std::path::{Path, PathBuf};

    use crate::library::{FsMediaLibrary, ImportRequest};
    use crate::provenance::{self, GeoTag};
    use crate::store::MemoryStore;
    use crate::types::MediaKind;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("gallery_mocker_tests")
            .join("eraser")
            .join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn fixture(dir: &Path) -> (MediaEraser, Arc<FsMediaLibrary>, LocalIndex) {
        let library = Arc::new(FsMediaLibrary::open(dir.join("library")).unwrap());
        let index = LocalIndex::new(Arc::new(MemoryStore::default()));
        let eraser = MediaEraser::new(library.clone(), index.clone());
        (eraser, library, index)
    }

    async fn import(library: &FsMediaLibrary, name: &str, tag: Option<GeoTag>) -> String {
        let id = library
            .import(ImportRequest::from_bytes(
                MediaKind::Photo,
                name.to_string(),
                vec![1, 2, 3],
                "jpg",
            ))
            .await
            .unwrap();
        if let Some(tag) = tag {
            library
                .update_metadata(&id, Utc::now(), tag)
                .await
                .unwrap();
        }
        id
    }

    #[tokio::test]
    async fn delete_tracked_removes_indexed_entries() {
        let dir = test_dir("tracked");
        let (eraser, library, index) = fixture(&dir);

        let mine = import(&library, "mine", Some(provenance::MARKER)).await;
        let theirs = import(&library, "theirs", None).await;
        index.append(&mine).unwrap();

        let deleted = eraser.delete_tracked().await.unwrap();
        assert_eq!(deleted, 1);

        let remaining = library.fetch_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, theirs);
        assert!(index.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_tracked_tolerates_stale_ids_and_clears_index() {
        let dir = test_dir("stale");
        let (eraser, _library, index) = fixture(&dir);
        index.append("long-gone").unwrap();

        let deleted = eraser.delete_tracked().await.unwrap();
        assert_eq!(deleted, 0);
        assert!(index.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_tracked_clears_empty_index() {
        let dir = test_dir("empty");
        let (eraser, _library, index) = fixture(&dir);
        assert_eq!(eraser.delete_tracked().await.unwrap(), 0);
        assert!(index.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn scan_removes_all_and_only_marker_entries() {
        let dir = test_dir("scan");
        let (eraser, library, index) = fixture(&dir);

        let mine_a = import(&library, "a", Some(provenance::MARKER)).await;
        let mine_b = import(&library, "b", Some(provenance::MARKER)).await;
        let untagged = import(&library, "untagged", None).await;
        let mut near = provenance::MARKER;
        near.latitude += 1e-9;
        let near_miss = import(&library, "near", Some(near)).await;
        // The scan must not depend on the index at all.
        index.append(&mine_a).unwrap();

        let deleted = eraser.delete_by_provenance_scan().await.unwrap();
        assert_eq!(deleted, 2);

        let remaining: Vec<String> = library
            .fetch_all()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert!(!remaining.contains(&mine_a));
        assert!(!remaining.contains(&mine_b));
        assert!(remaining.contains(&untagged));
        assert!(remaining.contains(&near_miss));
        assert!(index.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn tracked_then_scan_finds_nothing() {
        let dir = test_dir("tracked_then_scan");
        let (eraser, library, index) = fixture(&dir);

        let mine = import(&library, "mine", Some(provenance::MARKER)).await;
        index.append(&mine).unwrap();

        eraser.delete_tracked().await.unwrap();
        let second_pass = eraser.delete_by_provenance_scan().await.unwrap();
        assert_eq!(second_pass, 0);
    }
}

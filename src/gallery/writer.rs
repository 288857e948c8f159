//! Media writer: imports photos and videos into the library, tags them with
//! the provenance marker and a creation date, and records their identifiers
//! in the local index.
//!
//! Ordering matters. The identifier is appended to the index right after the
//! import commit, before the metadata transaction, so a process death between
//! the two commit points still leaves the asset discoverable through the
//! index. An asset that dies before tagging is not yet findable by the
//! provenance scan; that gap is accepted, not retried.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};

use super::error::WriteError;
use crate::compose;
use crate::library::{AssetId, ImportRequest, MediaLibrary};
use crate::provenance;
use crate::store::LocalIndex;
use crate::types::MediaKind;
use crate::util;

/// Transformation flags and creation-date override for a photo write.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhotoOptions {
    pub overlay_text: bool,
    pub random_tint: bool,
    /// `None` means "now".
    pub creation_date: Option<DateTime<Utc>>,
}

pub struct MediaWriter {
    library: Arc<dyn MediaLibrary>,
    index: LocalIndex,
}

impl MediaWriter {
    pub fn new(library: Arc<dyn MediaLibrary>, index: LocalIndex) -> Self {
        Self { library, index }
    }

    /// Write a photo from `source` into the library.
    ///
    /// With no transformation requested the file bytes are imported directly
    /// (the fast path). Otherwise the image is decoded, tinted and/or
    /// captioned, re-encoded and imported.
    pub async fn write_photo(&self, source: &Path, opts: PhotoOptions) -> Result<(), WriteError> {
        if !opts.overlay_text && !opts.random_tint {
            return self
                .import_direct(source, MediaKind::Photo, opts.creation_date)
                .await;
        }
        self.import_composited(source, opts).await
    }

    /// Write a video from `source` into the library. Always the direct path;
    /// there is no compositing for video.
    pub async fn write_video(
        &self,
        source: &Path,
        creation_date: Option<DateTime<Utc>>,
    ) -> Result<(), WriteError> {
        self.import_direct(source, MediaKind::Video, creation_date)
            .await
    }

    async fn import_direct(
        &self,
        source: &Path,
        media: MediaKind,
        creation_date: Option<DateTime<Utc>>,
    ) -> Result<(), WriteError> {
        // Surface unreadable sources as an I/O error before touching the
        // library, mirroring the decode path.
        tokio::fs::metadata(source).await?;

        let random_text = format!("[{}]", util::random_string(5));
        let name = util::display_name(Local::now(), &random_text);

        let id = self
            .library
            .import(ImportRequest::from_file(media, name, source.to_path_buf()))
            .await?;
        self.index.append(&id)?;

        self.tag_assets(&[id], creation_date).await
    }

    async fn import_composited(&self, source: &Path, opts: PhotoOptions) -> Result<(), WriteError> {
        let bytes = tokio::fs::read(source).await?;
        let random_text = format!("[{}]", util::random_string(5));
        let now = Local::now();
        let name = util::display_name(now, &random_text);

        // Pixel work on a blocking thread; images can be tens of megapixels.
        let encoded = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, WriteError> {
            let mut image = image::load_from_memory(&bytes)?;
            if opts.random_tint {
                image = image::DynamicImage::ImageRgba8(compose::random_tint(&image));
            }
            let composited = if opts.overlay_text {
                compose::with_caption(&image, &random_text, &util::name_timestamp(now))
            } else {
                image.to_rgba8()
            };
            Ok(compose::encode_jpeg(&composited)?)
        })
        .await??;

        let id = self
            .library
            .import(ImportRequest::from_bytes(
                MediaKind::Photo,
                name,
                encoded,
                "jpg",
            ))
            .await?;
        self.index.append(&id)?;

        self.tag_assets(&[id], opts.creation_date).await
    }

    /// Second commit point: one metadata transaction per imported asset,
    /// setting creation date (caller's or now) and the provenance marker.
    /// A placeholder identifier issued by the store is tracked as well.
    async fn tag_assets(
        &self,
        ids: &[AssetId],
        creation_date: Option<DateTime<Utc>>,
    ) -> Result<(), WriteError> {
        let date = creation_date.unwrap_or_else(Utc::now);
        for id in ids {
            if let Some(placeholder) = self
                .library
                .update_metadata(id, date, provenance::MARKER)
                .await?
            {
                self.index.append(&placeholder)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{Rgba, RgbaImage};
    use std::fs;
    use std::path::PathBuf;

    use crate::library::{AssetEntry, FsMediaLibrary, LibraryError};
    use crate::provenance::GeoTag;
    use crate::store::MemoryStore;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("gallery_mocker_tests")
            .join("writer")
            .join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn fixture(dir: &Path) -> (MediaWriter, Arc<FsMediaLibrary>, LocalIndex) {
        let library = Arc::new(FsMediaLibrary::open(dir.join("library")).unwrap());
        let index = LocalIndex::new(Arc::new(MemoryStore::default()));
        let writer = MediaWriter::new(library.clone(), index.clone());
        (writer, library, index)
    }

    fn sample_photo(dir: &Path) -> PathBuf {
        let img = RgbaImage::from_pixel(64, 64, Rgba([120, 40, 200, 255]));
        let path = dir.join("sample.png");
        img.save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn direct_photo_write_tags_and_indexes() {
        let dir = test_dir("direct");
        let (writer, library, index) = fixture(&dir);
        let source = sample_photo(&dir);

        writer
            .write_photo(&source, PhotoOptions::default())
            .await
            .unwrap();

        let entries = library.fetch_all().await.unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert!(entry.location.unwrap().is_marker());
        assert!(entry.display_name.starts_with("gallery_mocker_"));
        assert_eq!(index.load().unwrap(), vec![entry.id.clone()]);
    }

    #[tokio::test]
    async fn direct_write_keeps_source_extension() {
        let dir = test_dir("extension");
        let (writer, library, _) = fixture(&dir);
        let source = sample_photo(&dir);

        writer
            .write_photo(&source, PhotoOptions::default())
            .await
            .unwrap();
        let id = &library.fetch_all().await.unwrap()[0].id;
        assert!(library
            .root()
            .join("assets")
            .join(format!("{id}.png"))
            .exists());
    }

    #[tokio::test]
    async fn caller_creation_date_is_applied() {
        let dir = test_dir("date");
        let (writer, library, _) = fixture(&dir);
        let source = sample_photo(&dir);
        let date = Utc::now() - chrono::Duration::days(365);

        writer
            .write_photo(
                &source,
                PhotoOptions {
                    creation_date: Some(date),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(library.fetch_all().await.unwrap()[0].creation_date, date);
    }

    #[tokio::test]
    async fn composited_write_re_encodes_payload() {
        let dir = test_dir("composited");
        let (writer, library, index) = fixture(&dir);
        let source = sample_photo(&dir);

        writer
            .write_photo(
                &source,
                PhotoOptions {
                    overlay_text: true,
                    random_tint: true,
                    creation_date: None,
                },
            )
            .await
            .unwrap();

        let entries = library.fetch_all().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].location.unwrap().is_marker());
        assert_eq!(index.load().unwrap().len(), 1);
        // Composited output is re-encoded, so the payload is a jpg.
        let id = &entries[0].id;
        assert!(library
            .root()
            .join("assets")
            .join(format!("{id}.jpg"))
            .exists());
    }

    #[tokio::test]
    async fn video_write_uses_direct_path() {
        let dir = test_dir("video");
        let (writer, library, index) = fixture(&dir);
        let source = dir.join("clip.mp4");
        fs::write(&source, b"not-really-mp4").unwrap();

        writer.write_video(&source, None).await.unwrap();

        let entries = library.fetch_all().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].media, MediaKind::Video);
        assert!(entries[0].location.unwrap().is_marker());
        assert_eq!(index.load().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_source_is_an_io_error_and_writes_nothing() {
        let dir = test_dir("missing_source");
        let (writer, library, index) = fixture(&dir);

        let err = writer
            .write_photo(&dir.join("nope.png"), PhotoOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WriteError::Io(_)));
        assert!(library.fetch_all().await.unwrap().is_empty());
        assert!(index.load().unwrap().is_empty());
    }

    /// Library double whose metadata transaction issues a fresh placeholder
    /// identifier, the way some backing stores do.
    struct RetaggingLibrary {
        inner: FsMediaLibrary,
    }

    #[async_trait]
    impl MediaLibrary for RetaggingLibrary {
        async fn import(&self, request: ImportRequest) -> Result<AssetId, LibraryError> {
            self.inner.import(request).await
        }

        async fn update_metadata(
            &self,
            id: &str,
            creation_date: DateTime<Utc>,
            location: GeoTag,
        ) -> Result<Option<AssetId>, LibraryError> {
            self.inner
                .update_metadata(id, creation_date, location)
                .await?;
            Ok(Some(format!("{id}/placeholder")))
        }

        async fn delete(&self, ids: &[AssetId]) -> Result<(), LibraryError> {
            self.inner.delete(ids).await
        }

        async fn fetch_by_ids(&self, ids: &[AssetId]) -> Result<Vec<AssetEntry>, LibraryError> {
            self.inner.fetch_by_ids(ids).await
        }

        async fn fetch_all(&self) -> Result<Vec<AssetEntry>, LibraryError> {
            self.inner.fetch_all().await
        }
    }

    #[tokio::test]
    async fn placeholder_id_from_metadata_step_is_indexed_too() {
        let dir = test_dir("placeholder");
        let library = Arc::new(RetaggingLibrary {
            inner: FsMediaLibrary::open(dir.join("library")).unwrap(),
        });
        let index = LocalIndex::new(Arc::new(MemoryStore::default()));
        let writer = MediaWriter::new(library, index.clone());
        let source = sample_photo(&dir);

        writer
            .write_photo(&source, PhotoOptions::default())
            .await
            .unwrap();

        let ids = index.load().unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[1], format!("{}/placeholder", ids[0]));
    }
}

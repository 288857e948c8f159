//! Per-kind download status, recomputed at startup from the cache directory
//! and kept current by applying coordinator events.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::kinds::SampleVideo;
use super::DownloadEvent;

/// Status of one downloadable kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DownloadStatus {
    NotDownloaded,
    InProgress { progress: f64 },
    Downloaded,
}

impl DownloadStatus {
    pub fn is_downloaded(&self) -> bool {
        matches!(self, DownloadStatus::Downloaded)
    }

    pub fn progress(&self) -> Option<f64> {
        match self {
            DownloadStatus::InProgress { progress } => Some(*progress),
            _ => None,
        }
    }
}

/// Catalog of download statuses, one entry per kind.
///
/// Single-writer: exactly one owner applies coordinator events, so the
/// mapping never sees interleaved updates.
#[derive(Debug)]
pub struct DownloadCatalog {
    cache_dir: PathBuf,
    status: HashMap<SampleVideo, DownloadStatus>,
}

impl DownloadCatalog {
    /// Build the catalog from the cache directory: a kind is `Downloaded`
    /// iff its deterministic cache file exists.
    pub fn scan(cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        let status = SampleVideo::ALL
            .into_iter()
            .map(|kind| {
                let status = if kind.cache_path(&cache_dir).exists() {
                    DownloadStatus::Downloaded
                } else {
                    DownloadStatus::NotDownloaded
                };
                (kind, status)
            })
            .collect();
        Self { cache_dir, status }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn status(&self, kind: SampleVideo) -> DownloadStatus {
        self.status
            .get(&kind)
            .copied()
            .unwrap_or(DownloadStatus::NotDownloaded)
    }

    /// Apply one coordinator event.
    ///
    /// A failure leaves the entry at its last reported value; only a cancel
    /// resets it. A failed row keeps its in-progress look until retried or
    /// cancelled.
    pub fn apply(&mut self, kind: SampleVideo, event: &DownloadEvent) {
        match event {
            DownloadEvent::Progress(progress) => {
                self.status
                    .insert(kind, DownloadStatus::InProgress { progress: *progress });
            }
            DownloadEvent::Finished(_) => {
                self.status.insert(kind, DownloadStatus::Downloaded);
            }
            DownloadEvent::Cancelled => {
                self.status.insert(kind, DownloadStatus::NotDownloaded);
            }
            DownloadEvent::Failed(_) => {}
        }
    }

    /// Remove every kind's cache file and reset its status.
    ///
    /// Hard-fails on the first missing file: unlike the eraser's tolerant
    /// by-identifier path, an expected-but-absent cache file means the
    /// catalog's view of the world is wrong, and remaining removals are not
    /// attempted.
    pub fn delete_downloads(&mut self) -> std::io::Result<()> {
        for kind in SampleVideo::ALL {
            std::fs::remove_file(kind.cache_path(&self.cache_dir))?;
            self.status.insert(kind, DownloadStatus::NotDownloaded);
        }
        Ok(())
    }
}

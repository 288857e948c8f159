//! On-demand download of remote sample videos.
//!
//! One coordinator owns a single active-transfer slot: at most one fetch is
//! in flight at any time, and a second `start` is rejected while the slot is
//! occupied. The transfer streams into a `.part` file next to the final
//! cache path and renames it into place on a 2xx completion. All observable
//! state flows through one event channel to a single consumer, which applies
//! it to the [`DownloadCatalog`].
//!
//! A non-2xx completion is logged and dropped without an event or a catalog
//! change; the consumer detects the freed slot by polling.

pub mod catalog;
pub mod error;
pub mod kinds;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub use catalog::{DownloadCatalog, DownloadStatus};
pub use error::TransferError;
pub use kinds::SampleVideo;

/// One observable step of a transfer.
#[derive(Debug)]
pub enum DownloadEvent {
    /// Fraction of the payload written so far, non-decreasing in [0, 1].
    Progress(f64),
    /// The payload was relocated to its cache path.
    Finished(PathBuf),
    /// The transport or the disk failed mid-stream.
    Failed(TransferError),
    /// The transfer was cancelled by the user.
    Cancelled,
}

/// An event tagged with the kind it belongs to.
#[derive(Debug)]
pub struct DownloadUpdate {
    pub kind: SampleVideo,
    pub event: DownloadEvent,
}

/// The transient state of an in-flight transfer.
struct ActiveDownload {
    kind: SampleVideo,
    token: CancellationToken,
}

/// Explicitly owned download coordinator (no global state).
///
/// Construct once, share as `Arc`, and consume the returned receiver from a
/// single task.
pub struct DownloadCoordinator {
    client: Client,
    cache_dir: PathBuf,
    events: mpsc::UnboundedSender<DownloadUpdate>,
    active: Mutex<Option<ActiveDownload>>,
    /// Redirects every transfer to a local test server.
    #[cfg(test)]
    test_url: Mutex<Option<String>>,
}

impl DownloadCoordinator {
    /// Create a coordinator writing into `cache_dir`, together with the
    /// single observer's event stream.
    pub fn new(
        client: Client,
        cache_dir: impl Into<PathBuf>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<DownloadUpdate>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let coordinator = Arc::new(Self {
            client,
            cache_dir: cache_dir.into(),
            events,
            active: Mutex::new(None),
            #[cfg(test)]
            test_url: Mutex::new(None),
        });
        (coordinator, receiver)
    }

    fn url_for(&self, kind: SampleVideo) -> String {
        #[cfg(test)]
        if let Some(url) = self.test_url.lock().unwrap().clone() {
            return url;
        }
        kind.url().to_string()
    }

    /// Kind currently occupying the active slot, if any.
    pub fn active_kind(&self) -> Option<SampleVideo> {
        self.active.lock().unwrap().as_ref().map(|a| a.kind)
    }

    /// Begin a background fetch of `kind`.
    ///
    /// Rejected with [`TransferError::Busy`] while another transfer is
    /// active; there is no queue.
    pub fn start(self: &Arc<Self>, kind: SampleVideo) -> Result<(), TransferError> {
        let token = CancellationToken::new();
        {
            let mut active = self.active.lock().unwrap();
            if let Some(current) = active.as_ref() {
                return Err(TransferError::Busy {
                    active: current.kind,
                });
            }
            *active = Some(ActiveDownload {
                kind,
                token: token.clone(),
            });
        }

        tracing::info!(kind = %kind, url = kind.url(), "Starting download");
        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator.run_transfer(kind, token).await;
        });
        Ok(())
    }

    /// Cancel the active transfer, if any.
    ///
    /// The observer is notified synchronously; the transfer task cleans up
    /// its partial file in the background.
    pub fn cancel(&self) {
        let cancelled = self.active.lock().unwrap().take();
        if let Some(active) = cancelled {
            tracing::info!(kind = %active.kind, "Cancelling download");
            active.token.cancel();
            let _ = self.events.send(DownloadUpdate {
                kind: active.kind,
                event: DownloadEvent::Cancelled,
            });
        }
    }

    /// Free the slot when the transfer ends on its own. After a cancel the
    /// slot was already taken by [`DownloadCoordinator::cancel`].
    fn release_slot(&self, token: &CancellationToken) {
        if token.is_cancelled() {
            return;
        }
        *self.active.lock().unwrap() = None;
    }

    fn send(&self, kind: SampleVideo, event: DownloadEvent) {
        let _ = self.events.send(DownloadUpdate { kind, event });
    }

    async fn run_transfer(self: Arc<Self>, kind: SampleVideo, token: CancellationToken) {
        let part_path = self.cache_dir.join(format!("{}.part", kind.file_name()));

        match self.transfer(kind, &part_path, &token).await {
            Ok(Some(final_path)) => {
                self.release_slot(&token);
                self.send(kind, DownloadEvent::Finished(final_path));
            }
            Ok(None) => {
                // Cancelled, or a silently dropped non-2xx completion. The
                // cancel path already notified the observer.
                let _ = fs::remove_file(&part_path).await;
                self.release_slot(&token);
            }
            Err(error) => {
                let _ = fs::remove_file(&part_path).await;
                self.release_slot(&token);
                if token.is_cancelled() {
                    // The observer already saw Cancelled; a transport error
                    // caused by tearing the connection down is expected.
                    tracing::debug!(kind = %kind, %error, "Error after cancellation");
                } else {
                    tracing::error!(kind = %kind, %error, "Download failed");
                    self.send(kind, DownloadEvent::Failed(error));
                }
            }
        }
    }

    /// Stream the payload to `part_path`, then rename onto the cache path.
    ///
    /// Returns `Ok(Some(path))` on success and `Ok(None)` when nothing more
    /// should happen (cancellation, or the dropped non-2xx completion).
    async fn transfer(
        &self,
        kind: SampleVideo,
        part_path: &Path,
        token: &CancellationToken,
    ) -> Result<Option<PathBuf>, TransferError> {
        fs::create_dir_all(&self.cache_dir).await?;

        let response = self.client.get(self.url_for(kind)).send().await?;
        let status = response.status();
        if !status.is_success() {
            // No event fires for a non-2xx completion; the result is
            // dropped and only the log records it.
            tracing::error!(
                kind = %kind,
                "Dropping download result: {}",
                TransferError::Status {
                    status: status.as_u16()
                }
            );
            return Ok(None);
        }

        let expected = response
            .content_length()
            .unwrap_or(kind.size_mb() * 1024 * 1024);

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(part_path)
            .await?;

        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        loop {
            let chunk = tokio::select! {
                _ = token.cancelled() => return Ok(None),
                chunk = stream.next() => chunk,
            };
            let Some(chunk) = chunk else { break };
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;

            let fraction = (written as f64 / expected as f64).min(1.0);
            self.send(kind, DownloadEvent::Progress(fraction));
        }
        file.flush().await?;
        drop(file);

        if token.is_cancelled() {
            return Ok(None);
        }

        // Atomic relocation onto the cache path, replacing any previous file.
        let final_path = kind.cache_path(&self.cache_dir);
        fs::rename(part_path, &final_path).await?;
        tracing::info!(kind = %kind, path = %final_path.display(), "Download complete");
        Ok(Some(final_path))
    }
}

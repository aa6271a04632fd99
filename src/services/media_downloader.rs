// src/services/media_downloader.rs
//
// Streams a media file and its thumbnail into the media store.
//
// RULES:
// - Bytes land in a `.part` sibling first; final names appear only after
//   BOTH files arrived
// - Any failure removes every partial and final file this download created
// - Progress is reported on a channel and never blocks the download
// - Records are NOT touched here; callers update them after success

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::{AppError, AppResult};
use crate::infrastructure::{MediaSource, MediaStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStatus {
    /// Percent of the main media file received
    InProgress(u8),
    Succeeded,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub media_url: String,
    pub media_target: PathBuf,
    pub thumbnail_url: String,
    pub thumbnail_target: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedMedia {
    pub media_path: PathBuf,
    pub thumbnail_path: PathBuf,
    /// Size of the media file
    pub bytes: u64,
}

/// Run a blocking storage call off the async runtime
pub async fn run_blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

pub struct MediaDownloader {
    source: Arc<dyn MediaSource>,
    chunk_timeout: Duration,
}

impl MediaDownloader {
    pub fn new(source: Arc<dyn MediaSource>, chunk_timeout: Duration) -> Self {
        Self {
            source,
            chunk_timeout,
        }
    }

    pub async fn download(
        &self,
        request: &DownloadRequest,
        progress: Option<&UnboundedSender<DownloadStatus>>,
    ) -> AppResult<DownloadedMedia> {
        let report = |status: DownloadStatus| {
            if let Some(tx) = progress {
                // A dropped receiver only means nobody is watching
                let _ = tx.send(status);
            }
        };

        let media_part = MediaStore::partial_path(&request.media_target);
        let thumb_part = MediaStore::partial_path(&request.thumbnail_target);

        let result = self
            .fetch_both(request, &media_part, &thumb_part, &report)
            .await;

        match result {
            Ok(bytes) => {
                report(DownloadStatus::Succeeded);
                log::info!(
                    "Downloaded {} ({} bytes)",
                    request.media_target.display(),
                    bytes
                );
                Ok(DownloadedMedia {
                    media_path: request.media_target.clone(),
                    thumbnail_path: request.thumbnail_target.clone(),
                    bytes,
                })
            }
            Err(e) => {
                for path in [&media_part, &thumb_part] {
                    remove_quietly(path).await;
                }
                log::warn!("Download of {} failed: {}", request.media_url, e);
                report(DownloadStatus::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn fetch_both(
        &self,
        request: &DownloadRequest,
        media_part: &Path,
        thumb_part: &Path,
        report: &(dyn Fn(DownloadStatus) + Sync),
    ) -> AppResult<u64> {
        let bytes = self
            .stream_to(&request.media_url, media_part, Some(report))
            .await?;
        self.stream_to(&request.thumbnail_url, thumb_part, None)
            .await?;

        tokio::fs::rename(media_part, &request.media_target).await?;
        if let Err(e) = tokio::fs::rename(thumb_part, &request.thumbnail_target).await {
            remove_quietly(&request.media_target).await;
            return Err(e.into());
        }
        Ok(bytes)
    }

    async fn stream_to(
        &self,
        url: &str,
        target: &Path,
        report: Option<&(dyn Fn(DownloadStatus) + Sync)>,
    ) -> AppResult<u64> {
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut body = self.source.open(url).await?;
        let total = body.content_length();
        let mut file = tokio::fs::File::create(target).await?;
        let mut received: u64 = 0;
        let mut last_pct: Option<u8> = None;

        loop {
            let chunk = tokio::time::timeout(self.chunk_timeout, body.next_chunk())
                .await
                .map_err(|_| AppError::Other(format!("Timed out receiving {}", url)))??;
            let Some(chunk) = chunk else { break };

            file.write_all(&chunk).await?;
            received += chunk.len() as u64;

            if let (Some(report), Some(total)) = (report, total) {
                let pct = percent(received, total);
                if last_pct != Some(pct) {
                    last_pct = Some(pct);
                    report(DownloadStatus::InProgress(pct));
                }
            }
        }

        file.flush().await?;
        if let Some(total) = total {
            if received != total {
                return Err(AppError::Other(format!(
                    "Incomplete download of {}: {} of {} bytes",
                    url, received, total
                )));
            }
        }
        Ok(received)
    }
}

fn percent(received: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((received.min(total) * 100) / total) as u8
}

async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Could not remove {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryMediaSource;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    fn request(store: &MediaStore, media_url: &str, thumb_url: &str) -> DownloadRequest {
        DownloadRequest {
            media_url: media_url.to_string(),
            media_target: store.performance_video_path(1),
            thumbnail_url: thumb_url.to_string(),
            thumbnail_target: store.performance_thumbnail_path(1),
        }
    }

    fn files_in(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_download_reports_progress_and_renames() {
        let dir = TempDir::new().unwrap();
        let store = MediaStore::new(dir.path());
        let source = InMemoryMediaSource::new()
            .with_blob("mem://video", vec![7u8; 16])
            .with_blob("mem://thumb", vec![1u8; 3]);
        let downloader = MediaDownloader::new(Arc::new(source), Duration::from_secs(5));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let req = request(&store, "mem://video", "mem://thumb");
        let done = downloader.download(&req, Some(&tx)).await.unwrap();
        drop(tx);

        assert_eq!(done.bytes, 16);
        assert_eq!(std::fs::read(&req.media_target).unwrap().len(), 16);
        assert!(req.thumbnail_target.exists());

        let mut statuses = Vec::new();
        while let Some(s) = rx.recv().await {
            statuses.push(s);
        }
        assert_eq!(statuses.first(), Some(&DownloadStatus::InProgress(25)));
        assert!(statuses.contains(&DownloadStatus::InProgress(100)));
        assert_eq!(statuses.last(), Some(&DownloadStatus::Succeeded));
    }

    #[tokio::test]
    async fn test_failed_thumbnail_leaves_no_files() {
        let dir = TempDir::new().unwrap();
        let store = MediaStore::new(dir.path());
        let source = InMemoryMediaSource::new().with_blob("mem://video", vec![7u8; 16]);
        let downloader = MediaDownloader::new(Arc::new(source), Duration::from_secs(5));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let req = request(&store, "mem://video", "mem://missing");
        assert!(downloader.download(&req, Some(&tx)).await.is_err());
        drop(tx);

        assert_eq!(files_in(&store.dir(crate::infrastructure::MediaKind::Performance)), 0);
        assert_eq!(
            files_in(&store.dir(crate::infrastructure::MediaKind::PerformanceThumbnail)),
            0
        );

        let mut last = None;
        while let Some(s) = rx.recv().await {
            last = Some(s);
        }
        assert!(matches!(last, Some(DownloadStatus::Failed(_))));
    }

    #[tokio::test]
    async fn test_broken_stream_is_cleaned_up() {
        let dir = TempDir::new().unwrap();
        let store = MediaStore::new(dir.path());
        let source = InMemoryMediaSource::new()
            .with_broken_blob("mem://video", vec![7u8; 16])
            .with_blob("mem://thumb", vec![1u8; 3]);
        let downloader = MediaDownloader::new(Arc::new(source), Duration::from_secs(5));

        let req = request(&store, "mem://video", "mem://thumb");
        assert!(downloader.download(&req, None).await.is_err());
        assert_eq!(files_in(&store.dir(crate::infrastructure::MediaKind::Performance)), 0);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 0), 100);
        assert_eq!(percent(5, 10), 50);
        assert_eq!(percent(20, 10), 100);
    }
}

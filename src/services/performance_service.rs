// src/services/performance_service.rs
//
// Performance videos: catalogue records plus their local copies.
//
// RULES:
// - A record is marked downloaded only after both files are in place
// - Removing a download clears the record before the files go
// - Bundled assets never overwrite an existing record

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::domain::{validate_performance, Performance, PerformanceCategory, RecordId};
use crate::error::{AppError, AppResult};
use crate::events::{EventBus, MediaDownloadCompleted, MediaDownloadFailed, MediaFilesReleased};
use crate::infrastructure::{MediaKind, MediaStore, PreloadedAsset};
use crate::repositories::{PerformanceCriteria, PerformanceRepository};
use crate::services::media_downloader::{
    run_blocking, DownloadRequest, DownloadStatus, MediaDownloader,
};

const PRELOADED_EXTENSION: &str = "mp4";

pub struct PerformanceService {
    performance_repo: Arc<dyn PerformanceRepository>,
    media_store: Arc<MediaStore>,
    downloader: Arc<MediaDownloader>,
    event_bus: Arc<EventBus>,
}

impl PerformanceService {
    pub fn new(
        performance_repo: Arc<dyn PerformanceRepository>,
        media_store: Arc<MediaStore>,
        downloader: Arc<MediaDownloader>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            performance_repo,
            media_store,
            downloader,
            event_bus,
        }
    }

    pub fn create_performance(&self, mut performance: Performance) -> AppResult<Performance> {
        validate_performance(&performance).map_err(AppError::Domain)?;
        performance.id = self.performance_repo.insert(&performance)?;
        Ok(performance)
    }

    pub fn update_performance(&self, performance: &Performance) -> AppResult<()> {
        validate_performance(performance).map_err(AppError::Domain)?;
        self.performance_repo.update(performance)
    }

    pub fn delete_performance(&self, id: RecordId) -> AppResult<()> {
        let performance = self.require(id)?;
        self.performance_repo.delete(id)?;
        self.release_files(&performance);
        Ok(())
    }

    pub fn get_performance(&self, id: RecordId) -> AppResult<Option<Performance>> {
        self.performance_repo.get_by_id(id)
    }

    pub fn list_performances(&self, criteria: &PerformanceCriteria) -> AppResult<Vec<Performance>> {
        self.performance_repo.list(criteria)
    }

    pub fn list_page(
        &self,
        criteria: &PerformanceCriteria,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<Performance>> {
        self.performance_repo.list_page(criteria, limit, offset)
    }

    pub fn downloaded(&self) -> AppResult<Vec<Performance>> {
        self.performance_repo.list(&PerformanceCriteria {
            downloaded_only: true,
            ..PerformanceCriteria::default()
        })
    }

    pub fn record_view(&self, id: RecordId) -> AppResult<()> {
        self.performance_repo.increment_view_count(id)
    }

    pub fn is_downloaded(&self, performance: &Performance) -> bool {
        performance.is_downloaded && Path::new(&performance.video_path).is_file()
    }

    /// Bytes held by downloaded videos and their thumbnails
    pub fn disk_usage(&self) -> u64 {
        self.media_store.disk_usage(MediaKind::Performance)
            + self.media_store.disk_usage(MediaKind::PerformanceThumbnail)
    }

    pub async fn download(
        &self,
        id: RecordId,
        video_url: &str,
        thumbnail_url: &str,
        progress: Option<UnboundedSender<DownloadStatus>>,
    ) -> AppResult<Performance> {
        let repo = Arc::clone(&self.performance_repo);
        let performance =
            run_blocking(move || repo.get_by_id(id)?.ok_or(AppError::NotFound)).await?;

        let request = DownloadRequest {
            media_url: video_url.to_string(),
            media_target: self.media_store.performance_video_path(id),
            thumbnail_url: thumbnail_url.to_string(),
            thumbnail_target: self.media_store.performance_thumbnail_path(id),
        };
        let owner = format!("performance {}", id);

        let done = match self.downloader.download(&request, progress.as_ref()).await {
            Ok(done) => done,
            Err(e) => {
                self.event_bus
                    .emit(MediaDownloadFailed::new(owner, e.to_string()));
                return Err(e);
            }
        };

        let video = done.media_path.to_string_lossy().into_owned();
        let thumb = done.thumbnail_path.to_string_lossy().into_owned();
        let repo = Arc::clone(&self.performance_repo);
        let (v, t) = (video.clone(), thumb.clone());
        if let Err(e) = run_blocking(move || repo.set_download(id, &v, &t, true)).await {
            self.media_store.remove(&done.media_path);
            self.media_store.remove(&done.thumbnail_path);
            return Err(e);
        }

        log::info!("Performance {} downloaded ({} bytes)", id, done.bytes);
        self.event_bus
            .emit(MediaDownloadCompleted::new(owner, done.bytes));
        Ok(Performance {
            video_path: video,
            thumbnail_path: thumb,
            is_downloaded: true,
            ..performance
        })
    }

    pub fn remove_download(&self, id: RecordId) -> AppResult<()> {
        let performance = self.require(id)?;
        if !performance.is_downloaded {
            return Ok(());
        }
        self.performance_repo.set_download(id, "", "", false)?;
        self.release_files(&performance);
        Ok(())
    }

    /// Register the `<id>_<name>.mp4` videos bundled in `dir` under their bundled ids.
    /// Assets whose id is already taken are skipped. Returns the new records.
    pub fn import_preloaded(
        &self,
        dir: &Path,
        artist_id: RecordId,
        category: PerformanceCategory,
    ) -> AppResult<Vec<Performance>> {
        let mut imported = Vec::new();

        for asset in MediaStore::discover_preloaded(dir, PRELOADED_EXTENSION) {
            if self.performance_repo.get_by_id(asset.id)?.is_some() {
                log::debug!("Preloaded performance {} already present", asset.id);
                continue;
            }

            let mut performance = Performance::new(asset.name.replace('_', " "), artist_id, category);
            performance.description = "Preloaded performance".to_string();
            validate_performance(&performance).map_err(AppError::Domain)?;
            performance.id = self.performance_repo.insert_with_id(asset.id, &performance)?;

            match self.copy_asset(&performance, &asset) {
                Ok((video, thumb)) => {
                    self.performance_repo
                        .set_download(performance.id, &video, &thumb, true)?;
                    performance.video_path = video;
                    performance.thumbnail_path = thumb;
                    performance.is_downloaded = true;
                }
                Err(e) => log::warn!(
                    "Could not copy preloaded video {}: {}",
                    asset.media_path.display(),
                    e
                ),
            }
            imported.push(performance);
        }

        log::info!("Imported {} preloaded performances", imported.len());
        Ok(imported)
    }

    fn copy_asset(
        &self,
        performance: &Performance,
        asset: &PreloadedAsset,
    ) -> AppResult<(String, String)> {
        let video = self.media_store.performance_video_path(performance.id);
        if let Some(parent) = video.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&asset.media_path, &video)?;

        let thumb = match &asset.thumbnail_path {
            Some(source) => {
                let target = self.media_store.performance_thumbnail_path(performance.id);
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(source, &target)?;
                target.to_string_lossy().into_owned()
            }
            None => String::new(),
        };
        Ok((video.to_string_lossy().into_owned(), thumb))
    }

    fn release_files(&self, performance: &Performance) {
        if !performance.is_downloaded {
            return;
        }
        let paths: Vec<String> = [&performance.video_path, &performance.thumbnail_path]
            .into_iter()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect();
        if !paths.is_empty() {
            self.event_bus.emit(MediaFilesReleased::new(
                format!("performance {}", performance.id),
                paths,
            ));
        }
    }

    fn require(&self, id: RecordId) -> AppResult<Performance> {
        self.performance_repo.get_by_id(id)?.ok_or(AppError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::create_test_pool;
    use crate::domain::Artist;
    use crate::events::register_media_cleanup_handlers;
    use crate::infrastructure::InMemoryMediaSource;
    use crate::repositories::{ArtistRepository, SqliteArtistRepository, SqlitePerformanceRepository};
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        _db: TempDir,
        media: TempDir,
        service: PerformanceService,
        bus: Arc<EventBus>,
        artist: RecordId,
    }

    fn fixture(source: InMemoryMediaSource) -> Fixture {
        let (db, pool) = create_test_pool();
        let media = TempDir::new().unwrap();
        let artist = SqliteArtistRepository::new(Arc::clone(&pool))
            .insert(&Artist::new("Kelucharan", ""))
            .unwrap();
        let store = Arc::new(MediaStore::new(media.path().join("store")));
        store.ensure_layout().unwrap();
        let bus = Arc::new(EventBus::new());
        register_media_cleanup_handlers(&bus, Arc::clone(&store));

        let service = PerformanceService::new(
            Arc::new(SqlitePerformanceRepository::new(pool)),
            store,
            Arc::new(MediaDownloader::new(Arc::new(source), Duration::from_secs(5))),
            Arc::clone(&bus),
        );
        Fixture {
            _db: db,
            media,
            service,
            bus,
            artist,
        }
    }

    #[tokio::test]
    async fn test_download_reports_and_delete_cleans_up() {
        let source = InMemoryMediaSource::new()
            .with_blob("mem://odissi.mp4", vec![7u8; 12])
            .with_blob("mem://odissi.jpg", vec![1u8; 3]);
        let f = fixture(source);
        let p = f
            .service
            .create_performance(Performance::new("Odissi", f.artist, PerformanceCategory::Dance))
            .unwrap();

        let downloaded = f
            .service
            .download(p.id, "mem://odissi.mp4", "mem://odissi.jpg", None)
            .await
            .unwrap();
        assert!(f.service.is_downloaded(&downloaded));
        assert_eq!(f.service.disk_usage(), 15);
        assert!(f
            .bus
            .get_event_log()
            .iter()
            .any(|e| e.event_type == "MediaDownloadCompleted"));

        f.service.delete_performance(p.id).unwrap();
        assert!(f.service.get_performance(p.id).unwrap().is_none());
        assert_eq!(f.service.disk_usage(), 0);
    }

    #[tokio::test]
    async fn test_failed_download_emits_failure() {
        let f = fixture(InMemoryMediaSource::new());
        let p = f
            .service
            .create_performance(Performance::new("Raga", f.artist, PerformanceCategory::Music))
            .unwrap();

        assert!(f
            .service
            .download(p.id, "mem://nowhere.mp4", "mem://nowhere.jpg", None)
            .await
            .is_err());
        assert!(f
            .bus
            .get_event_log()
            .iter()
            .any(|e| e.event_type == "MediaDownloadFailed"));
        assert!(f.service.downloaded().unwrap().is_empty());
    }

    #[test]
    fn test_import_preloaded_skips_taken_ids() {
        let f = fixture(InMemoryMediaSource::new());
        let existing = f
            .service
            .create_performance(Performance::new("Existing", f.artist, PerformanceCategory::Music))
            .unwrap();

        let bundle = f.media.path().join("bundle");
        fs::create_dir_all(&bundle).unwrap();
        fs::write(bundle.join(format!("{}_old.mp4", existing.id)), b"old").unwrap();
        fs::write(bundle.join("42_dawn_raga.mp4"), b"video").unwrap();
        fs::write(bundle.join("42_dawn_raga.jpg"), b"jpg").unwrap();

        let imported = f
            .service
            .import_preloaded(&bundle, f.artist, PerformanceCategory::Music)
            .unwrap();

        assert_eq!(imported.len(), 1);
        let p = &imported[0];
        assert_eq!(p.id, 42);
        assert_eq!(p.title, "dawn raga");
        assert!(f.service.is_downloaded(p));
        assert!(Path::new(&p.thumbnail_path).is_file());

        let stored = f.service.get_performance(p.id).unwrap().unwrap();
        assert!(stored.is_downloaded);
        assert_eq!(f.service.list_performances(&PerformanceCriteria::default()).unwrap().len(), 2);

        // The same bundle a second time adds nothing
        let again = f
            .service
            .import_preloaded(&bundle, f.artist, PerformanceCategory::Music)
            .unwrap();
        assert!(again.is_empty());
        assert_eq!(f.service.list_performances(&PerformanceCriteria::default()).unwrap().len(), 2);

        // Ids assigned afterwards continue past the bundled one
        let later = f
            .service
            .create_performance(Performance::new("Later", f.artist, PerformanceCategory::Music))
            .unwrap();
        assert!(later.id > 42);
    }
}

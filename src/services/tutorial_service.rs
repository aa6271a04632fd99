// src/services/tutorial_service.rs

use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::domain::tutorial::invariants::validate_progress;
use crate::domain::{validate_tutorial, RecordId, Tutorial};
use crate::error::{AppError, AppResult};
use crate::events::{
    EventBus, MediaDownloadCompleted, MediaDownloadFailed, MediaFilesReleased,
    TutorialProgressUpdated,
};
use crate::infrastructure::MediaStore;
use crate::repositories::{ProgressFilter, TutorialCriteria, TutorialRepository};
use crate::services::media_downloader::{
    run_blocking, DownloadRequest, DownloadStatus, MediaDownloader,
};

pub struct TutorialService {
    tutorial_repo: Arc<dyn TutorialRepository>,
    media_store: Arc<MediaStore>,
    downloader: Arc<MediaDownloader>,
    event_bus: Arc<EventBus>,
}

impl TutorialService {
    pub fn new(
        tutorial_repo: Arc<dyn TutorialRepository>,
        media_store: Arc<MediaStore>,
        downloader: Arc<MediaDownloader>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            tutorial_repo,
            media_store,
            downloader,
            event_bus,
        }
    }

    pub fn create_tutorial(&self, mut tutorial: Tutorial) -> AppResult<Tutorial> {
        validate_tutorial(&tutorial).map_err(AppError::Domain)?;
        tutorial.id = self.tutorial_repo.insert(&tutorial)?;
        Ok(tutorial)
    }

    pub fn update_tutorial(&self, tutorial: &Tutorial) -> AppResult<()> {
        validate_tutorial(tutorial).map_err(AppError::Domain)?;
        self.tutorial_repo.update(tutorial)
    }

    /// Delete the record, then any downloaded files
    pub fn delete_tutorial(&self, id: RecordId) -> AppResult<()> {
        let tutorial = self.require(id)?;
        self.tutorial_repo.delete(id)?;
        self.release_files(&tutorial);
        Ok(())
    }

    pub fn get_tutorial(&self, id: RecordId) -> AppResult<Option<Tutorial>> {
        self.tutorial_repo.get_by_id(id)
    }

    pub fn list_tutorials(&self, criteria: &TutorialCriteria) -> AppResult<Vec<Tutorial>> {
        self.tutorial_repo.list(criteria)
    }

    /// Newest first
    pub fn list_page(
        &self,
        criteria: &TutorialCriteria,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<Tutorial>> {
        self.tutorial_repo.list_page(criteria, limit, offset)
    }

    pub fn search_tutorials(&self, query: &str) -> AppResult<Vec<Tutorial>> {
        self.tutorial_repo.list(&TutorialCriteria {
            query: Some(query.to_string()),
            ..TutorialCriteria::default()
        })
    }

    pub fn in_progress(&self) -> AppResult<Vec<Tutorial>> {
        self.tutorial_repo.list(&TutorialCriteria {
            progress: ProgressFilter::InProgress,
            ..TutorialCriteria::default()
        })
    }

    pub fn completed(&self) -> AppResult<Vec<Tutorial>> {
        self.tutorial_repo.list(&TutorialCriteria {
            progress: ProgressFilter::Completed,
            ..TutorialCriteria::default()
        })
    }

    pub fn downloaded(&self) -> AppResult<Vec<Tutorial>> {
        self.tutorial_repo.list(&TutorialCriteria {
            downloaded_only: true,
            ..TutorialCriteria::default()
        })
    }

    pub fn record_view(&self, id: RecordId) -> AppResult<()> {
        self.tutorial_repo.increment_view_count(id)
    }

    pub fn update_progress(&self, id: RecordId, progress: u8) -> AppResult<()> {
        validate_progress(progress).map_err(AppError::Domain)?;
        self.tutorial_repo.set_progress(id, progress)?;

        self.event_bus
            .emit(TutorialProgressUpdated::new(id, progress));
        Ok(())
    }

    pub fn complete_quiz(&self, id: RecordId) -> AppResult<()> {
        self.tutorial_repo.set_quiz_completed(id, true)
    }

    /// Downloaded flag set AND the video file still present
    pub fn is_downloaded(&self, tutorial: &Tutorial) -> bool {
        tutorial.is_downloaded && Path::new(&tutorial.video_path).is_file()
    }

    /// Fetch the video and thumbnail, then point the record at them
    pub async fn download(
        &self,
        id: RecordId,
        video_url: &str,
        thumbnail_url: &str,
        progress: Option<UnboundedSender<DownloadStatus>>,
    ) -> AppResult<Tutorial> {
        let repo = Arc::clone(&self.tutorial_repo);
        let tutorial = run_blocking(move || repo.get_by_id(id)?.ok_or(AppError::NotFound)).await?;

        let request = DownloadRequest {
            media_url: video_url.to_string(),
            media_target: self.media_store.tutorial_video_path(id),
            thumbnail_url: thumbnail_url.to_string(),
            thumbnail_target: self.media_store.tutorial_thumbnail_path(id),
        };
        let owner = format!("tutorial {}", id);

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
        let repo = Arc::clone(&self.tutorial_repo);
        let (v, t) = (video.clone(), thumb.clone());
        if let Err(e) = run_blocking(move || repo.set_download(id, &v, &t, true)).await {
            self.media_store.remove(&done.media_path);
            self.media_store.remove(&done.thumbnail_path);
            return Err(e);
        }

        self.event_bus
            .emit(MediaDownloadCompleted::new(owner, done.bytes));
        Ok(Tutorial {
            video_path: video,
            thumbnail_path: thumb,
            is_downloaded: true,
            ..tutorial
        })
    }

    /// Forget the local copy: clear the flag, then remove the files
    pub fn remove_download(&self, id: RecordId) -> AppResult<()> {
        let tutorial = self.require(id)?;
        if !tutorial.is_downloaded {
            return Ok(());
        }
        self.tutorial_repo.set_download(id, "", "", false)?;
        self.release_files(&tutorial);
        Ok(())
    }

    fn release_files(&self, tutorial: &Tutorial) {
        let paths: Vec<String> = [&tutorial.video_path, &tutorial.thumbnail_path]
            .into_iter()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect();
        if tutorial.is_downloaded && !paths.is_empty() {
            self.event_bus.emit(MediaFilesReleased::new(
                format!("tutorial {}", tutorial.id),
                paths,
            ));
        }
    }

    fn require(&self, id: RecordId) -> AppResult<Tutorial> {
        self.tutorial_repo.get_by_id(id)?.ok_or(AppError::NotFound)
    }
}

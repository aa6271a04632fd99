// src/services/ar_model_service.rs

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::domain::{validate_ar_model, ArCategory, ArModel, RecordId};
use crate::error::{AppError, AppResult};
use crate::events::{EventBus, MediaDownloadCompleted, MediaDownloadFailed, MediaFilesReleased};
use crate::infrastructure::{MediaStore, PreloadedAsset};
use crate::repositories::{ArModelCriteria, ArModelRepository};
use crate::services::media_downloader::{
    run_blocking, DownloadRequest, DownloadStatus, MediaDownloader,
};

const PRELOADED_EXTENSION: &str = "glb";

pub struct ArModelService {
    model_repo: Arc<dyn ArModelRepository>,
    media_store: Arc<MediaStore>,
    downloader: Arc<MediaDownloader>,
    event_bus: Arc<EventBus>,
}

impl ArModelService {
    pub fn new(
        model_repo: Arc<dyn ArModelRepository>,
        media_store: Arc<MediaStore>,
        downloader: Arc<MediaDownloader>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            model_repo,
            media_store,
            downloader,
            event_bus,
        }
    }

    pub fn create_model(&self, mut model: ArModel) -> AppResult<ArModel> {
        validate_ar_model(&model).map_err(AppError::Domain)?;
        model.id = self.model_repo.insert(&model)?;
        Ok(model)
    }

    pub fn update_model(&self, model: &ArModel) -> AppResult<()> {
        validate_ar_model(model).map_err(AppError::Domain)?;
        self.model_repo.update(model)
    }

    pub fn delete_model(&self, id: RecordId) -> AppResult<()> {
        let model = self.require(id)?;
        self.model_repo.delete(id)?;
        self.release_files(&model);
        Ok(())
    }

    pub fn get_model(&self, id: RecordId) -> AppResult<Option<ArModel>> {
        self.model_repo.get_by_id(id)
    }

    pub fn list_models(&self, criteria: &ArModelCriteria) -> AppResult<Vec<ArModel>> {
        self.model_repo.list(criteria)
    }

    pub fn list_page(
        &self,
        criteria: &ArModelCriteria,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<ArModel>> {
        self.model_repo.list_page(criteria, limit, offset)
    }

    /// Models that place a given artwork in AR
    pub fn models_for_artwork(&self, artwork_id: RecordId) -> AppResult<Vec<ArModel>> {
        self.model_repo.list(&ArModelCriteria::for_artwork(artwork_id))
    }

    pub fn downloaded(&self) -> AppResult<Vec<ArModel>> {
        self.model_repo.list(&ArModelCriteria {
            downloaded_only: true,
            ..ArModelCriteria::default()
        })
    }

    pub fn total_downloaded_size(&self) -> AppResult<u64> {
        self.model_repo.total_downloaded_size()
    }

    pub fn is_downloaded(&self, model: &ArModel) -> bool {
        model.is_downloaded && Path::new(&model.model_file_path).is_file()
    }

    pub async fn download(
        &self,
        id: RecordId,
        model_url: &str,
        thumbnail_url: &str,
        progress: Option<UnboundedSender<DownloadStatus>>,
    ) -> AppResult<ArModel> {
        let repo = Arc::clone(&self.model_repo);
        let model = run_blocking(move || repo.get_by_id(id)?.ok_or(AppError::NotFound)).await?;

        let request = DownloadRequest {
            media_url: model_url.to_string(),
            media_target: self.media_store.ar_model_path(id, &model.name),
            thumbnail_url: thumbnail_url.to_string(),
            thumbnail_target: self.media_store.ar_thumbnail_path(id, &model.name),
        };
        let owner = format!("AR model {}", id);

        let done = match self.downloader.download(&request, progress.as_ref()).await {
            Ok(done) => done,
            Err(e) => {
                self.event_bus
                    .emit(MediaDownloadFailed::new(owner, e.to_string()));
                return Err(e);
            }
        };

        // Size of the model itself; the thumbnail is not counted
        let file_size = fs::metadata(&done.media_path).map(|m| m.len())?;
        let path = done.media_path.to_string_lossy().into_owned();
        let thumb = done.thumbnail_path.to_string_lossy().into_owned();
        let repo = Arc::clone(&self.model_repo);
        let (p, t) = (path.clone(), thumb.clone());
        if let Err(e) = run_blocking(move || repo.set_download(id, &p, &t, file_size, true)).await {
            self.media_store.remove(&done.media_path);
            self.media_store.remove(&done.thumbnail_path);
            return Err(e);
        }

        self.event_bus
            .emit(MediaDownloadCompleted::new(owner, done.bytes));
        Ok(ArModel {
            model_file_path: path,
            thumbnail_path: thumb,
            file_size,
            is_downloaded: true,
            ..model
        })
    }

    pub fn remove_download(&self, id: RecordId) -> AppResult<()> {
        let model = self.require(id)?;
        if !model.is_downloaded {
            return Ok(());
        }
        self.model_repo.set_download(id, "", "", 0, false)?;
        self.release_files(&model);
        Ok(())
    }

    /// Register the `<id>_<name>.glb` models bundled in `dir` under their
    /// bundled ids, skipping ids that are already in the catalogue
    pub fn import_preloaded(
        &self,
        dir: &Path,
        artist_id: RecordId,
        category: ArCategory,
    ) -> AppResult<Vec<ArModel>> {
        let mut imported = Vec::new();

        for asset in MediaStore::discover_preloaded(dir, PRELOADED_EXTENSION) {
            if self.model_repo.get_by_id(asset.id)?.is_some() {
                continue;
            }

            let mut model = ArModel::new(asset.name.replace('_', " "), artist_id, category);
            model.description = "Preloaded model".to_string();
            validate_ar_model(&model).map_err(AppError::Domain)?;
            model.id = self.model_repo.insert_with_id(asset.id, &model)?;

            match self.copy_asset(&model, &asset) {
                Ok((path, thumb)) => {
                    self.model_repo
                        .set_download(model.id, &path, &thumb, asset.file_size, true)?;
                    model.model_file_path = path;
                    model.thumbnail_path = thumb;
                    model.file_size = asset.file_size;
                    model.is_downloaded = true;
                }
                Err(e) => log::warn!(
                    "Could not copy preloaded model {}: {}",
                    asset.media_path.display(),
                    e
                ),
            }
            imported.push(model);
        }

        log::info!("Imported {} preloaded AR models", imported.len());
        Ok(imported)
    }

    fn copy_asset(&self, model: &ArModel, asset: &PreloadedAsset) -> AppResult<(String, String)> {
        let target = self.media_store.ar_model_path(model.id, &model.name);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&asset.media_path, &target)?;

        let thumb = match &asset.thumbnail_path {
            Some(source) => {
                let thumb_target = self.media_store.ar_thumbnail_path(model.id, &model.name);
                if let Some(parent) = thumb_target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(source, &thumb_target)?;
                thumb_target.to_string_lossy().into_owned()
            }
            None => String::new(),
        };
        Ok((target.to_string_lossy().into_owned(), thumb))
    }

    fn release_files(&self, model: &ArModel) {
        if !model.is_downloaded {
            return;
        }
        let paths: Vec<String> = [&model.model_file_path, &model.thumbnail_path]
            .into_iter()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect();
        if !paths.is_empty() {
            self.event_bus
                .emit(MediaFilesReleased::new(format!("AR model {}", model.id), paths));
        }
    }

    fn require(&self, id: RecordId) -> AppResult<ArModel> {
        self.model_repo.get_by_id(id)?.ok_or(AppError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::create_test_pool;
    use crate::domain::Artist;
    use crate::events::register_media_cleanup_handlers;
    use crate::infrastructure::InMemoryMediaSource;
    use crate::repositories::{ArtistRepository, SqliteArModelRepository, SqliteArtistRepository};
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        _db: TempDir,
        media: TempDir,
        service: ArModelService,
        artist: RecordId,
    }

    fn fixture(source: InMemoryMediaSource) -> Fixture {
        let (db, pool) = create_test_pool();
        let media = TempDir::new().unwrap();
        let artist = SqliteArtistRepository::new(Arc::clone(&pool))
            .insert(&Artist::new("Ramkinkar", ""))
            .unwrap();
        let store = Arc::new(MediaStore::new(media.path().join("store")));
        let bus = Arc::new(EventBus::new());
        register_media_cleanup_handlers(&bus, Arc::clone(&store));

        let service = ArModelService::new(
            Arc::new(SqliteArModelRepository::new(pool)),
            store,
            Arc::new(MediaDownloader::new(Arc::new(source), Duration::from_secs(5))),
            bus,
        );
        Fixture {
            _db: db,
            media,
            service,
            artist,
        }
    }

    #[tokio::test]
    async fn test_download_records_size_and_remove_resets_it() {
        let source = InMemoryMediaSource::new()
            .with_blob("mem://santhal.glb", vec![0u8; 9])
            .with_blob("mem://santhal.jpg", vec![0u8; 2]);
        let f = fixture(source);
        let model = f
            .service
            .create_model(ArModel::new("Santhal Family", f.artist, ArCategory::Sculpture))
            .unwrap();

        let downloaded = f
            .service
            .download(model.id, "mem://santhal.glb", "mem://santhal.jpg", None)
            .await
            .unwrap();
        assert_eq!(downloaded.file_size, 9);
        assert!(f.service.is_downloaded(&downloaded));
        assert_eq!(f.service.total_downloaded_size().unwrap(), 9);

        f.service.remove_download(model.id).unwrap();
        assert_eq!(f.service.total_downloaded_size().unwrap(), 0);
        assert!(!Path::new(&downloaded.model_file_path).exists());
        assert!(f.service.get_model(model.id).unwrap().is_some());
    }

    #[test]
    fn test_import_preloaded() {
        let f = fixture(InMemoryMediaSource::new());
        let bundle = f.media.path().join("bundle");
        fs::create_dir_all(&bundle).unwrap();
        fs::write(bundle.join("3_yaksha.glb"), vec![1u8; 20]).unwrap();
        fs::write(bundle.join("readme.txt"), b"ignored").unwrap();

        let imported = f
            .service
            .import_preloaded(&bundle, f.artist, ArCategory::Sculpture)
            .unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].id, 3);
        assert_eq!(imported[0].name, "yaksha");
        assert_eq!(imported[0].file_size, 20);
        assert!(imported[0].thumbnail_path.is_empty());
        assert_eq!(f.service.total_downloaded_size().unwrap(), 20);

        let again = f
            .service
            .import_preloaded(&bundle, f.artist, ArCategory::Sculpture)
            .unwrap();
        assert!(again.is_empty());
        assert_eq!(f.service.list_models(&ArModelCriteria::default()).unwrap().len(), 1);
        assert_eq!(f.service.total_downloaded_size().unwrap(), 20);
    }

    #[test]
    fn test_invalid_scale_rejected() {
        let f = fixture(InMemoryMediaSource::new());
        let mut model = ArModel::new("Flat", f.artist, ArCategory::Abstract);
        model.scale = 0.0;
        assert!(matches!(f.service.create_model(model), Err(AppError::Domain(_))));
    }
}

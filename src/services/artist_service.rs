// src/services/artist_service.rs
//
// Artists and the catalogue entries that belong to them.
//
// RULES:
// - Deleting an artist cascades in the database first (artworks,
//   tutorials, performances, AR models)
// - Files of the cascaded records are released only after that delete
//   succeeds; a failed delete leaves every file in place
// - File removal failures are logged by the cleanup handler, never returned

use std::sync::Arc;

use crate::domain::{validate_artist, Artist, RecordId};
use crate::error::{AppError, AppResult};
use crate::events::{ArtistCreated, ArtistDeleted, EventBus, MediaFilesReleased};
use crate::repositories::{
    ArModelCriteria, ArModelRepository, ArtistRepository, ArtworkCriteria, ArtworkRepository,
    PerformanceCriteria, PerformanceRepository, TutorialCriteria, TutorialRepository,
};

/// Artists and everything that is removed with them
pub struct ArtistService {
    artist_repo: Arc<dyn ArtistRepository>,
    artwork_repo: Arc<dyn ArtworkRepository>,
    tutorial_repo: Arc<dyn TutorialRepository>,
    performance_repo: Arc<dyn PerformanceRepository>,
    ar_model_repo: Arc<dyn ArModelRepository>,
    event_bus: Arc<EventBus>,
}

impl ArtistService {
    pub fn new(
        artist_repo: Arc<dyn ArtistRepository>,
        artwork_repo: Arc<dyn ArtworkRepository>,
        tutorial_repo: Arc<dyn TutorialRepository>,
        performance_repo: Arc<dyn PerformanceRepository>,
        ar_model_repo: Arc<dyn ArModelRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            artist_repo,
            artwork_repo,
            tutorial_repo,
            performance_repo,
            ar_model_repo,
            event_bus,
        }
    }

    pub fn create_artist(&self, mut artist: Artist) -> AppResult<Artist> {
        validate_artist(&artist).map_err(AppError::Domain)?;
        artist.id = self.artist_repo.insert(&artist)?;

        self.event_bus
            .emit(ArtistCreated::new(artist.id, artist.name.clone()));
        Ok(artist)
    }

    pub fn update_artist(&self, artist: &Artist) -> AppResult<()> {
        validate_artist(artist).map_err(AppError::Domain)?;
        self.artist_repo.update(artist)
    }

    pub fn get_artist(&self, id: RecordId) -> AppResult<Option<Artist>> {
        self.artist_repo.get_by_id(id)
    }

    pub fn list_artists(&self) -> AppResult<Vec<Artist>> {
        self.artist_repo.list_all()
    }

    pub fn search_artists(&self, query: &str) -> AppResult<Vec<Artist>> {
        self.artist_repo.search(query)
    }

    /// Delete an artist. The database cascades to their artworks, tutorials,
    /// performances and AR models; their files are released afterwards.
    pub fn delete_artist(&self, id: RecordId) -> AppResult<()> {
        let artworks = self.artwork_repo.list(&ArtworkCriteria::by_artist(id))?;
        let mut paths: Vec<String> = artworks.iter().map(|a| a.image_path.clone()).collect();

        let tutorials = self.tutorial_repo.list(&TutorialCriteria {
            instructor_id: Some(id),
            ..TutorialCriteria::default()
        })?;
        for t in tutorials.into_iter().filter(|t| t.is_downloaded) {
            paths.extend([t.video_path, t.thumbnail_path]);
        }

        let performances = self.performance_repo.list(&PerformanceCriteria {
            artist_id: Some(id),
            ..PerformanceCriteria::default()
        })?;
        for p in performances.into_iter().filter(|p| p.is_downloaded) {
            paths.extend([p.video_path, p.thumbnail_path]);
        }

        let models = self.ar_model_repo.list(&ArModelCriteria {
            artist_id: Some(id),
            ..ArModelCriteria::default()
        })?;
        for m in models.into_iter().filter(|m| m.is_downloaded) {
            paths.extend([m.model_file_path, m.thumbnail_path]);
        }

        self.artist_repo.delete(id)?;
        log::info!("Deleted artist {} and {} artworks", id, artworks.len());

        self.event_bus.emit(ArtistDeleted::new(id, artworks.len()));
        paths.retain(|p| !p.is_empty());
        if !paths.is_empty() {
            self.event_bus
                .emit(MediaFilesReleased::new(format!("artist {}", id), paths));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::create_test_pool;
    use crate::domain::Artwork;
    use crate::events::register_media_cleanup_handlers;
    use crate::infrastructure::MediaStore;
    use crate::repositories::{
        SqliteArModelRepository, SqliteArtistRepository, SqliteArtworkRepository,
        SqlitePerformanceRepository, SqliteTutorialRepository,
    };
    use tempfile::TempDir;

    struct Fixture {
        _db_dir: TempDir,
        media_dir: TempDir,
        service: ArtistService,
        artworks: Arc<SqliteArtworkRepository>,
        store: Arc<MediaStore>,
    }

    fn fixture() -> Fixture {
        let (db_dir, pool) = create_test_pool();
        let media_dir = TempDir::new().unwrap();
        let store = Arc::new(MediaStore::new(media_dir.path()));
        store.ensure_layout().unwrap();

        let bus = Arc::new(EventBus::new());
        register_media_cleanup_handlers(&bus, Arc::clone(&store));

        let artworks = Arc::new(SqliteArtworkRepository::new(Arc::clone(&pool)));
        let service = ArtistService::new(
            Arc::new(SqliteArtistRepository::new(Arc::clone(&pool))),
            artworks.clone(),
            Arc::new(SqliteTutorialRepository::new(Arc::clone(&pool))),
            Arc::new(SqlitePerformanceRepository::new(Arc::clone(&pool))),
            Arc::new(SqliteArModelRepository::new(pool)),
            bus,
        );
        Fixture {
            _db_dir: db_dir,
            media_dir,
            service,
            artworks,
            store,
        }
    }

    #[test]
    fn test_deleting_artist_cascades_to_artworks_and_files() {
        let f = fixture();
        let artist = f.service.create_artist(Artist::new("Raja Ravi Varma", "")).unwrap();

        let source = f.media_dir.path().join("shakuntala.jpg");
        std::fs::write(&source, b"jpg").unwrap();
        let image = f.store.import_image(&source).unwrap();

        let mut artwork = Artwork::new("Shakuntala", "", artist.id, "painting");
        artwork.image_path = image.to_string_lossy().into_owned();
        let artwork_id = f.artworks.insert(&artwork).unwrap();

        f.service.delete_artist(artist.id).unwrap();

        assert!(f.service.get_artist(artist.id).unwrap().is_none());
        assert!(f.artworks.get_by_id(artwork_id).unwrap().is_none());
        assert!(!image.exists());
    }

    #[test]
    fn test_blank_name_is_rejected_before_storage() {
        let f = fixture();
        let result = f.service.create_artist(Artist::new("  ", ""));
        assert!(matches!(result, Err(AppError::Domain(_))));
        assert!(f.service.list_artists().unwrap().is_empty());
    }

    #[test]
    fn test_deleting_unknown_artist_is_not_found() {
        let f = fixture();
        assert!(matches!(f.service.delete_artist(99), Err(AppError::NotFound)));
    }
}

// src/app/catalog_init.rs
//
// Catalogue start-up and shutdown
//
// The single place where concrete types are chosen: the database handle,
// SQLite repositories, the media store, the HTTP media source and the
// event handlers. Everything above receives trait objects.
//
// RULES:
// - No global state; the returned Catalog owns the database handle
// - Handlers are registered before any service can emit
// - Shutdown checkpoints the database last

use std::sync::Arc;
use std::time::Duration;

use crate::application::AppState;
use crate::config::CatalogConfig;
use crate::db::{get_database_stats, verify_database_integrity, Database, DatabaseStats};
use crate::error::AppResult;
use crate::events::{register_media_cleanup_handlers, EventBus};
use crate::infrastructure::{HttpMediaSource, MediaSource, MediaStore, PreferencesStore};
use crate::repositories::*;
use crate::services::*;

/// A running catalogue: configuration, open database and wired services
pub struct Catalog {
    pub config: CatalogConfig,
    pub state: AppState,
    database: Database,
}

impl Catalog {
    /// Open the store and wire every service against the HTTP media source
    pub fn start(config: CatalogConfig) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.download_chunk_timeout_secs);
        let source: Arc<dyn MediaSource> = Arc::new(HttpMediaSource::new(timeout)?);
        Self::start_with_source(config, source)
    }

    /// Same as `start` with an explicit media source
    pub fn start_with_source(config: CatalogConfig, source: Arc<dyn MediaSource>) -> AppResult<Self> {
        config.validate()?;
        log::info!("[CATALOG] Starting in {}", config.data_dir.display());

        // 1. INFRASTRUCTURE
        let database = Database::open(&config)?;
        let media_store = Arc::new(MediaStore::new(config.media_root()));
        media_store.ensure_layout()?;
        let preferences = Arc::new(PreferencesStore::open(config.preferences_path())?);
        let event_bus = Arc::new(EventBus::new());
        register_media_cleanup_handlers(&event_bus, Arc::clone(&media_store));

        let downloader = Arc::new(MediaDownloader::new(
            source,
            Duration::from_secs(config.download_chunk_timeout_secs),
        ));

        // 2. REPOSITORIES
        let pool = database.pool();
        let artist_repo: Arc<dyn ArtistRepository> =
            Arc::new(SqliteArtistRepository::new(Arc::clone(&pool)));
        let artwork_repo: Arc<dyn ArtworkRepository> =
            Arc::new(SqliteArtworkRepository::new(Arc::clone(&pool)));
        let news_repo: Arc<dyn NewsRepository> =
            Arc::new(SqliteNewsRepository::new(Arc::clone(&pool)));
        let market_repo: Arc<dyn MarketRepository> =
            Arc::new(SqliteMarketRepository::new(Arc::clone(&pool)));
        let event_repo: Arc<dyn EventRepository> =
            Arc::new(SqliteEventRepository::new(Arc::clone(&pool)));
        let post_repo: Arc<dyn ForumPostRepository> =
            Arc::new(SqliteForumPostRepository::new(Arc::clone(&pool)));
        let comment_repo: Arc<dyn ForumCommentRepository> =
            Arc::new(SqliteForumCommentRepository::new(Arc::clone(&pool)));
        let tutorial_repo: Arc<dyn TutorialRepository> =
            Arc::new(SqliteTutorialRepository::new(Arc::clone(&pool)));
        let performance_repo: Arc<dyn PerformanceRepository> =
            Arc::new(SqlitePerformanceRepository::new(Arc::clone(&pool)));
        let ar_model_repo: Arc<dyn ArModelRepository> =
            Arc::new(SqliteArModelRepository::new(pool));

        // 3. SERVICES
        let state = AppState {
            artist_service: Arc::new(ArtistService::new(
                artist_repo,
                Arc::clone(&artwork_repo),
                Arc::clone(&tutorial_repo),
                Arc::clone(&performance_repo),
                Arc::clone(&ar_model_repo),
                Arc::clone(&event_bus),
            )),
            artwork_service: Arc::new(ArtworkService::new(
                Arc::clone(&artwork_repo),
                Arc::clone(&media_store),
                Arc::clone(&event_bus),
            )),
            news_service: Arc::new(NewsService::new(news_repo, Arc::clone(&event_bus))),
            market_service: Arc::new(MarketService::new(
                market_repo,
                artwork_repo,
                Arc::clone(&event_bus),
            )),
            event_service: Arc::new(EventService::new(event_repo, Arc::clone(&event_bus))),
            forum_service: Arc::new(ForumService::new(
                post_repo,
                comment_repo,
                Arc::clone(&preferences),
                Arc::clone(&event_bus),
            )),
            tutorial_service: Arc::new(TutorialService::new(
                tutorial_repo,
                Arc::clone(&media_store),
                Arc::clone(&downloader),
                Arc::clone(&event_bus),
            )),
            performance_service: Arc::new(PerformanceService::new(
                performance_repo,
                Arc::clone(&media_store),
                Arc::clone(&downloader),
                Arc::clone(&event_bus),
            )),
            ar_model_service: Arc::new(ArModelService::new(
                ar_model_repo,
                Arc::clone(&media_store),
                downloader,
                Arc::clone(&event_bus),
            )),
            event_bus,
            media_store,
            preferences,
            page_size: config.page_size,
        };

        log::info!("[CATALOG] Ready (page size {})", config.page_size);
        Ok(Self {
            config,
            state,
            database,
        })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Integrity check plus table counts
    pub fn health_check(&self) -> AppResult<DatabaseStats> {
        let conn = self.database.connection()?;
        verify_database_integrity(&conn)?;
        get_database_stats(&conn)
    }

    /// Drop the services, then checkpoint and release the database
    pub fn shutdown(self) -> AppResult<()> {
        let Self {
            state, database, ..
        } = self;
        drop(state);
        database.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Artist, Artwork, Performance, PerformanceCategory};
    use crate::infrastructure::InMemoryMediaSource;
    use tempfile::TempDir;

    fn start(dir: &TempDir, source: InMemoryMediaSource) -> Catalog {
        let mut config = CatalogConfig::in_directory(dir.path());
        config.page_size = 2;
        Catalog::start_with_source(config, Arc::new(source)).unwrap()
    }

    #[test]
    fn test_start_creates_layout_and_reports_health() {
        let dir = TempDir::new().unwrap();
        let catalog = start(&dir, InMemoryMediaSource::new());

        assert!(dir.path().join("artgallery.db").exists());
        assert!(dir.path().join("media").join("artwork_images").is_dir());

        let stats = catalog.health_check().unwrap();
        assert_eq!(stats.artwork_count, 0);
        catalog.shutdown().unwrap();
    }

    #[tokio::test]
    async fn test_artwork_list_pages_with_configured_size() {
        let dir = TempDir::new().unwrap();
        let catalog = start(&dir, InMemoryMediaSource::new());
        let state = &catalog.state;

        let artist = state
            .artist_service
            .create_artist(Artist::new("Jamini Roy", ""))
            .unwrap();
        for title in ["Mother", "Krishna", "Cats"] {
            state
                .artwork_service
                .create_artwork(Artwork::new(title, "", artist.id, "painting"))
                .unwrap();
        }

        let list = state.artwork_list();
        assert_eq!(list.load_next_page().await.unwrap(), 2);
        assert_eq!(list.load_next_page().await.unwrap(), 1);
        assert_eq!(list.load_next_page().await.unwrap(), 0);
        assert!(list.snapshot().end_of_data);

        // Cascade: the artist's works disappear from storage
        state.artist_service.delete_artist(artist.id).unwrap();
        assert_eq!(list.refresh().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_download_through_wired_services() {
        let dir = TempDir::new().unwrap();
        let source = InMemoryMediaSource::new()
            .with_blob("mem://v.mp4", vec![3u8; 8])
            .with_blob("mem://v.jpg", vec![4u8; 2]);
        let catalog = start(&dir, source);
        let state = &catalog.state;

        let artist = state
            .artist_service
            .create_artist(Artist::new("Birju", ""))
            .unwrap();
        let p = state
            .performance_service
            .create_performance(Performance::new("Kathak", artist.id, PerformanceCategory::Dance))
            .unwrap();
        let done = state
            .performance_service
            .download(p.id, "mem://v.mp4", "mem://v.jpg", None)
            .await
            .unwrap();
        assert!(done.video_path.starts_with(dir.path().to_str().unwrap()));

        // Deleting the artist releases the downloaded files
        state.artist_service.delete_artist(artist.id).unwrap();
        assert!(!std::path::Path::new(&done.video_path).exists());
    }
}

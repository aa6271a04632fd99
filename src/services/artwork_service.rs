// src/services/artwork_service.rs

use std::path::Path;
use std::sync::Arc;

use crate::domain::{validate_artwork, Artwork, RecordId};
use crate::error::{AppError, AppResult};
use crate::events::{ArtworkCreated, ArtworkDeleted, ArtworkUpdated, EventBus, MediaFilesReleased};
use crate::infrastructure::MediaStore;
use crate::repositories::{ArtworkCriteria, ArtworkRepository};

pub struct ArtworkService {
    artwork_repo: Arc<dyn ArtworkRepository>,
    media_store: Arc<MediaStore>,
    event_bus: Arc<EventBus>,
}

impl ArtworkService {
    pub fn new(
        artwork_repo: Arc<dyn ArtworkRepository>,
        media_store: Arc<MediaStore>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            artwork_repo,
            media_store,
            event_bus,
        }
    }

    pub fn create_artwork(&self, mut artwork: Artwork) -> AppResult<Artwork> {
        validate_artwork(&artwork).map_err(AppError::Domain)?;
        artwork.id = self.artwork_repo.insert(&artwork)?;

        self.event_bus.emit(ArtworkCreated::new(
            artwork.id,
            artwork.artist_id,
            artwork.title.clone(),
        ));
        Ok(artwork)
    }

    pub fn update_artwork(&self, artwork: &Artwork) -> AppResult<()> {
        validate_artwork(artwork).map_err(AppError::Domain)?;
        self.artwork_repo.update(artwork)?;

        self.event_bus.emit(ArtworkUpdated::new(artwork.id));
        Ok(())
    }

    /// Delete the record, then its image file
    pub fn delete_artwork(&self, id: RecordId) -> AppResult<()> {
        let artwork = self.artwork_repo.get_by_id(id)?.ok_or(AppError::NotFound)?;
        self.artwork_repo.delete(id)?;

        self.event_bus.emit(ArtworkDeleted::new(id));
        if !artwork.image_path.is_empty() {
            self.event_bus.emit(MediaFilesReleased::new(
                format!("artwork {}", id),
                vec![artwork.image_path],
            ));
        }
        Ok(())
    }

    pub fn get_artwork(&self, id: RecordId) -> AppResult<Option<Artwork>> {
        self.artwork_repo.get_by_id(id)
    }

    pub fn list_artworks(&self, criteria: &ArtworkCriteria) -> AppResult<Vec<Artwork>> {
        self.artwork_repo.list(criteria)
    }

    /// Newest first
    pub fn list_page(
        &self,
        criteria: &ArtworkCriteria,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<Artwork>> {
        self.artwork_repo.list_page(criteria, limit, offset)
    }

    pub fn count_artworks(&self, criteria: &ArtworkCriteria) -> AppResult<i64> {
        self.artwork_repo.count(criteria)
    }

    pub fn search_artworks(&self, query: &str) -> AppResult<Vec<Artwork>> {
        self.artwork_repo.list(&ArtworkCriteria {
            query: Some(query.to_string()),
            ..ArtworkCriteria::default()
        })
    }

    pub fn artworks_for_sale(&self) -> AppResult<Vec<Artwork>> {
        self.artwork_repo.list(&ArtworkCriteria::for_sale())
    }

    pub fn artworks_by_artist(&self, artist_id: RecordId) -> AppResult<Vec<Artwork>> {
        self.artwork_repo.list(&ArtworkCriteria::by_artist(artist_id))
    }

    pub fn categories(&self) -> AppResult<Vec<String>> {
        self.artwork_repo.list_categories()
    }

    /// Copy `source` into the media store and point the artwork at it.
    /// The previous image, if any, is released once the record is updated.
    pub fn attach_image(&self, id: RecordId, source: &Path) -> AppResult<Artwork> {
        let mut artwork = self.artwork_repo.get_by_id(id)?.ok_or(AppError::NotFound)?;
        let imported = self.media_store.import_image(source)?;
        let previous = std::mem::replace(
            &mut artwork.image_path,
            imported.to_string_lossy().into_owned(),
        );

        if let Err(e) = self.artwork_repo.update(&artwork) {
            self.media_store.remove(&imported);
            return Err(e);
        }

        self.event_bus.emit(ArtworkUpdated::new(id));
        if !previous.is_empty() {
            self.event_bus
                .emit(MediaFilesReleased::new(format!("artwork {}", id), vec![previous]));
        }
        Ok(artwork)
    }
}

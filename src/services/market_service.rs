// src/services/market_service.rs

use std::sync::Arc;

use crate::domain::{validate_market_item, MarketItem, RecordId};
use crate::error::{AppError, AppResult};
use crate::events::{EventBus, MarketAvailabilityChanged, MarketItemListed};
use crate::repositories::{ArtworkRepository, MarketRepository};

pub struct MarketService {
    market_repo: Arc<dyn MarketRepository>,
    artwork_repo: Arc<dyn ArtworkRepository>,
    event_bus: Arc<EventBus>,
}

impl MarketService {
    pub fn new(
        market_repo: Arc<dyn MarketRepository>,
        artwork_repo: Arc<dyn ArtworkRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            market_repo,
            artwork_repo,
            event_bus,
        }
    }

    /// List an existing artwork on the marketplace
    pub fn list_item(&self, mut item: MarketItem) -> AppResult<MarketItem> {
        validate_market_item(&item).map_err(AppError::Domain)?;
        if self.artwork_repo.get_by_id(item.artwork_id)?.is_none() {
            return Err(AppError::NotFound);
        }
        item.id = self.market_repo.insert(&item)?;

        self.event_bus
            .emit(MarketItemListed::new(item.id, item.artwork_id));
        Ok(item)
    }

    pub fn update_item(&self, item: &MarketItem) -> AppResult<()> {
        validate_market_item(item).map_err(AppError::Domain)?;
        self.market_repo.update(item)
    }

    pub fn delete_item(&self, id: RecordId) -> AppResult<()> {
        self.market_repo.delete(id)
    }

    pub fn get_item(&self, id: RecordId) -> AppResult<Option<MarketItem>> {
        self.market_repo.get_by_id(id)
    }

    pub fn available_items(&self) -> AppResult<Vec<MarketItem>> {
        self.market_repo.list_available()
    }

    pub fn items_for_artwork(&self, artwork_id: RecordId) -> AppResult<Vec<MarketItem>> {
        self.market_repo.list_by_artwork(artwork_id)
    }

    pub fn set_available(&self, id: RecordId, available: bool) -> AppResult<()> {
        self.market_repo.set_available(id, available)?;
        self.event_bus
            .emit(MarketAvailabilityChanged::new(id, available));
        Ok(())
    }
}

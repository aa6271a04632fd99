// src/application/state.rs

use std::sync::Arc;

use crate::application::list_model::ListModel;
use crate::application::sources::{
    ArModelListSource, ArtworkListSource, EventListSource, ForumListSource,
    PerformanceListSource, TutorialListSource,
};
use crate::events::EventBus;
use crate::infrastructure::{MediaStore, PreferencesStore};
use crate::services::{
    ArModelService, ArtistService, ArtworkService, EventService, ForumService, MarketService,
    NewsService, PerformanceService, TutorialService,
};

/// Everything a UI layer needs, built once by the composition root.
/// All fields are Arc-wrapped so screens can share them freely.
pub struct AppState {
    pub event_bus: Arc<EventBus>,
    pub media_store: Arc<MediaStore>,
    pub preferences: Arc<PreferencesStore>,
    pub artist_service: Arc<ArtistService>,
    pub artwork_service: Arc<ArtworkService>,
    pub news_service: Arc<NewsService>,
    pub market_service: Arc<MarketService>,
    pub event_service: Arc<EventService>,
    pub forum_service: Arc<ForumService>,
    pub tutorial_service: Arc<TutorialService>,
    pub performance_service: Arc<PerformanceService>,
    pub ar_model_service: Arc<ArModelService>,
    /// Records per list page
    pub page_size: usize,
}

// List models start their own task, so these must run inside the runtime.
impl AppState {
    pub fn artwork_list(&self) -> ListModel<ArtworkListSource> {
        ListModel::spawn(
            ArtworkListSource::new(Arc::clone(&self.artwork_service)),
            self.page_size,
        )
    }

    pub fn event_list(&self) -> ListModel<EventListSource> {
        ListModel::spawn(
            EventListSource::new(Arc::clone(&self.event_service)),
            self.page_size,
        )
    }

    pub fn forum_list(&self) -> ListModel<ForumListSource> {
        ListModel::spawn(
            ForumListSource::new(Arc::clone(&self.forum_service)),
            self.page_size,
        )
    }

    pub fn tutorial_list(&self) -> ListModel<TutorialListSource> {
        ListModel::spawn(
            TutorialListSource::new(Arc::clone(&self.tutorial_service)),
            self.page_size,
        )
    }

    pub fn performance_list(&self) -> ListModel<PerformanceListSource> {
        ListModel::spawn(
            PerformanceListSource::new(Arc::clone(&self.performance_service)),
            self.page_size,
        )
    }

    pub fn ar_model_list(&self) -> ListModel<ArModelListSource> {
        ListModel::spawn(
            ArModelListSource::new(Arc::clone(&self.ar_model_service)),
            self.page_size,
        )
    }
}

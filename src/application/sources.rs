// src/application/sources.rs
//
// Per-feature list sources: how each list pages through its service,
// which filter it offers and how the visible items are ordered.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::application::list_model::ListSource;
use crate::domain::{
    ArCategory, ArModel, Artwork, Difficulty, Event, EventCategory, ForumCategory, ForumPost,
    Performance, PerformanceCategory, RecordId, Tutorial, TutorialCategory,
};
use crate::error::AppResult;
use crate::repositories::{
    ArModelCriteria, ArtworkCriteria, EventCriteria, PerformanceCriteria, PostCriteria,
    TutorialCriteria,
};
use crate::services::{
    ArModelService, ArtworkService, EventService, ForumService, PerformanceService,
    TutorialService,
};

// ============================================================================
// ARTWORKS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtworkFilter {
    /// Case-insensitive match on title or description; blank matches all
    pub query: String,
    /// Empty set matches every category
    pub categories: BTreeSet<String>,
}

impl ArtworkFilter {
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn matches(&self, artwork: &Artwork) -> bool {
        let category_ok = self.categories.is_empty()
            || self
                .categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(&artwork.category));
        category_ok && artwork.matches_query(&self.query)
    }
}

pub struct ArtworkListSource {
    service: Arc<ArtworkService>,
    criteria: ArtworkCriteria,
}

impl ArtworkListSource {
    pub fn new(service: Arc<ArtworkService>) -> Self {
        Self::with_criteria(service, ArtworkCriteria::default())
    }

    /// Page through a storage-side subset, e.g. one artist's works
    pub fn with_criteria(service: Arc<ArtworkService>, criteria: ArtworkCriteria) -> Self {
        Self { service, criteria }
    }
}

impl ListSource for ArtworkListSource {
    type Item = Artwork;
    type Filter = ArtworkFilter;

    fn id(item: &Artwork) -> RecordId {
        item.id
    }

    fn fetch_page(&self, offset: usize, limit: usize) -> AppResult<Vec<Artwork>> {
        self.service.list_page(&self.criteria, limit, offset)
    }

    fn insert(&self, item: Artwork) -> AppResult<Artwork> {
        self.service.create_artwork(item)
    }

    fn update(&self, item: &Artwork) -> AppResult<Artwork> {
        self.service.update_artwork(item)?;
        Ok(item.clone())
    }

    fn delete(&self, item: &Artwork) -> AppResult<()> {
        self.service.delete_artwork(item.id)
    }

    fn matches(filter: &ArtworkFilter, item: &Artwork) -> bool {
        filter.matches(item)
    }
}

// ============================================================================
// EVENTS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub category: Option<EventCategory>,
    pub attending_only: bool,
    /// Keep events whose span overlaps this window
    pub window: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        self.category.map_or(true, |c| event.category == c)
            && (!self.attending_only || event.is_user_attending)
            && self
                .window
                .map_or(true, |(start, end)| event.overlaps(start, end))
    }
}

pub struct EventListSource {
    service: Arc<EventService>,
    criteria: EventCriteria,
}

impl EventListSource {
    pub fn new(service: Arc<EventService>) -> Self {
        Self {
            service,
            criteria: EventCriteria::default(),
        }
    }

    pub fn with_criteria(service: Arc<EventService>, criteria: EventCriteria) -> Self {
        Self { service, criteria }
    }
}

impl ListSource for EventListSource {
    type Item = Event;
    type Filter = EventFilter;

    fn id(item: &Event) -> RecordId {
        item.id
    }

    fn fetch_page(&self, offset: usize, limit: usize) -> AppResult<Vec<Event>> {
        self.service.list_page(&self.criteria, limit, offset)
    }

    fn insert(&self, item: Event) -> AppResult<Event> {
        self.service.create_event(item)
    }

    /// Attendance and reminders come back as stored
    fn update(&self, item: &Event) -> AppResult<Event> {
        self.service.update_event(item)
    }

    fn delete(&self, item: &Event) -> AppResult<()> {
        self.service.delete_event(item.id)
    }

    fn matches(filter: &EventFilter, item: &Event) -> bool {
        filter.matches(item)
    }

    fn sort_visible(visible: &mut Vec<Event>) {
        visible.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
    }
}

// ============================================================================
// FORUM
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForumFilter {
    pub category: Option<ForumCategory>,
    pub query: String,
}

impl ForumFilter {
    pub fn matches(&self, post: &ForumPost) -> bool {
        self.category.map_or(true, |c| post.category == c) && post.matches_query(&self.query)
    }
}

pub struct ForumListSource {
    service: Arc<ForumService>,
    criteria: PostCriteria,
}

impl ForumListSource {
    pub fn new(service: Arc<ForumService>) -> Self {
        Self {
            service,
            criteria: PostCriteria::default(),
        }
    }
}

impl ListSource for ForumListSource {
    type Item = ForumPost;
    type Filter = ForumFilter;

    fn id(item: &ForumPost) -> RecordId {
        item.id
    }

    fn fetch_page(&self, offset: usize, limit: usize) -> AppResult<Vec<ForumPost>> {
        self.service.list_page(&self.criteria, limit, offset)
    }

    fn insert(&self, item: ForumPost) -> AppResult<ForumPost> {
        self.service.create_post(item)
    }

    fn update(&self, item: &ForumPost) -> AppResult<ForumPost> {
        self.service.edit_post(item)
    }

    fn delete(&self, item: &ForumPost) -> AppResult<()> {
        self.service.delete_post(item.id)
    }

    fn matches(filter: &ForumFilter, item: &ForumPost) -> bool {
        filter.matches(item)
    }

    /// Pinned first, then newest
    fn sort_visible(visible: &mut Vec<ForumPost>) {
        visible.sort_by(|a, b| {
            b.is_pinned
                .cmp(&a.is_pinned)
                .then(b.created_at.cmp(&a.created_at))
                .then(b.id.cmp(&a.id))
        });
    }
}

// ============================================================================
// TUTORIALS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TutorialFilter {
    pub category: Option<TutorialCategory>,
    pub difficulty: Option<Difficulty>,
    pub query: String,
}

impl TutorialFilter {
    pub fn matches(&self, tutorial: &Tutorial) -> bool {
        self.category.map_or(true, |c| tutorial.category == c)
            && self.difficulty.map_or(true, |d| tutorial.difficulty == d)
            && tutorial.matches_query(&self.query)
    }
}

pub struct TutorialListSource {
    service: Arc<TutorialService>,
}

impl TutorialListSource {
    pub fn new(service: Arc<TutorialService>) -> Self {
        Self { service }
    }
}

impl ListSource for TutorialListSource {
    type Item = Tutorial;
    type Filter = TutorialFilter;

    fn id(item: &Tutorial) -> RecordId {
        item.id
    }

    fn fetch_page(&self, offset: usize, limit: usize) -> AppResult<Vec<Tutorial>> {
        self.service
            .list_page(&TutorialCriteria::default(), limit, offset)
    }

    fn insert(&self, item: Tutorial) -> AppResult<Tutorial> {
        self.service.create_tutorial(item)
    }

    fn update(&self, item: &Tutorial) -> AppResult<Tutorial> {
        self.service.update_tutorial(item)?;
        Ok(item.clone())
    }

    fn delete(&self, item: &Tutorial) -> AppResult<()> {
        self.service.delete_tutorial(item.id)
    }

    fn matches(filter: &TutorialFilter, item: &Tutorial) -> bool {
        filter.matches(item)
    }

    fn sort_visible(visible: &mut Vec<Tutorial>) {
        visible.sort_by(|a, b| b.date_added.cmp(&a.date_added).then(b.id.cmp(&a.id)));
    }
}

// ============================================================================
// PERFORMANCES
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceFilter {
    pub category: Option<PerformanceCategory>,
    pub downloaded_only: bool,
}

impl PerformanceFilter {
    pub fn matches(&self, performance: &Performance) -> bool {
        self.category.map_or(true, |c| performance.category == c)
            && (!self.downloaded_only || performance.is_downloaded)
    }
}

pub struct PerformanceListSource {
    service: Arc<PerformanceService>,
}

impl PerformanceListSource {
    pub fn new(service: Arc<PerformanceService>) -> Self {
        Self { service }
    }
}

impl ListSource for PerformanceListSource {
    type Item = Performance;
    type Filter = PerformanceFilter;

    fn id(item: &Performance) -> RecordId {
        item.id
    }

    fn fetch_page(&self, offset: usize, limit: usize) -> AppResult<Vec<Performance>> {
        self.service
            .list_page(&PerformanceCriteria::default(), limit, offset)
    }

    fn insert(&self, item: Performance) -> AppResult<Performance> {
        self.service.create_performance(item)
    }

    fn update(&self, item: &Performance) -> AppResult<Performance> {
        self.service.update_performance(item)?;
        Ok(item.clone())
    }

    fn delete(&self, item: &Performance) -> AppResult<()> {
        self.service.delete_performance(item.id)
    }

    fn matches(filter: &PerformanceFilter, item: &Performance) -> bool {
        filter.matches(item)
    }

    fn sort_visible(visible: &mut Vec<Performance>) {
        visible.sort_by(|a, b| {
            b.date_recorded
                .cmp(&a.date_recorded)
                .then(b.id.cmp(&a.id))
        });
    }
}

// ============================================================================
// AR MODELS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArModelFilter {
    pub category: Option<ArCategory>,
    pub downloaded_only: bool,
}

impl ArModelFilter {
    pub fn matches(&self, model: &ArModel) -> bool {
        self.category.map_or(true, |c| model.category == c)
            && (!self.downloaded_only || model.is_downloaded)
    }
}

pub struct ArModelListSource {
    service: Arc<ArModelService>,
    criteria: ArModelCriteria,
}

impl ArModelListSource {
    pub fn new(service: Arc<ArModelService>) -> Self {
        Self {
            service,
            criteria: ArModelCriteria::default(),
        }
    }

    /// Only the models attached to one artwork
    pub fn for_artwork(service: Arc<ArModelService>, artwork_id: RecordId) -> Self {
        Self {
            service,
            criteria: ArModelCriteria::for_artwork(artwork_id),
        }
    }
}

impl ListSource for ArModelListSource {
    type Item = ArModel;
    type Filter = ArModelFilter;

    fn id(item: &ArModel) -> RecordId {
        item.id
    }

    fn fetch_page(&self, offset: usize, limit: usize) -> AppResult<Vec<ArModel>> {
        self.service.list_page(&self.criteria, limit, offset)
    }

    fn insert(&self, item: ArModel) -> AppResult<ArModel> {
        self.service.create_model(item)
    }

    fn update(&self, item: &ArModel) -> AppResult<ArModel> {
        self.service.update_model(item)?;
        Ok(item.clone())
    }

    fn delete(&self, item: &ArModel) -> AppResult<()> {
        self.service.delete_model(item.id)
    }

    fn matches(filter: &ArModelFilter, item: &ArModel) -> bool {
        filter.matches(item)
    }

    fn sort_visible(visible: &mut Vec<ArModel>) {
        visible.sort_by(|a, b| b.date_added.cmp(&a.date_added).then(b.id.cmp(&a.id)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::list_model::ListModel;
    use crate::db::connection::create_test_pool;
    use crate::domain::{Artist, Author};
    use crate::error::AppError;
    use crate::events::EventBus;
    use crate::infrastructure::{MediaStore, PreferencesStore};
    use crate::repositories::{
        ArtistRepository, SqliteArtistRepository, SqliteArtworkRepository,
        SqliteEventRepository, SqliteForumCommentRepository, SqliteForumPostRepository,
    };
    use chrono::Duration;
    use tempfile::TempDir;

    fn artwork_model(
        pool: &Arc<crate::db::ConnectionPool>,
        media: &TempDir,
    ) -> (ListModel<ArtworkListSource>, RecordId) {
        let artist = SqliteArtistRepository::new(Arc::clone(pool))
            .insert(&Artist::new("Amrita Sher-Gil", ""))
            .unwrap();
        let service = Arc::new(ArtworkService::new(
            Arc::new(SqliteArtworkRepository::new(Arc::clone(pool))),
            Arc::new(MediaStore::new(media.path())),
            Arc::new(EventBus::new()),
        ));
        (ListModel::spawn(ArtworkListSource::new(service), 20), artist)
    }

    fn titles(artworks: &[Artwork]) -> Vec<&str> {
        artworks.iter().map(|a| a.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_sun_query_keeps_relative_order() {
        let (_db, pool) = create_test_pool();
        let media = TempDir::new().unwrap();
        let (model, artist) = artwork_model(&pool, &media);

        for (title, category) in [
            ("Sunset", "painting"),
            ("Ocean View", "photography"),
            ("Sunrise", "painting"),
        ] {
            model
                .insert(Artwork::new(title, "", artist, category))
                .await
                .unwrap();
        }
        model.refresh().await.unwrap();
        let all = model.snapshot().items.clone();
        assert_eq!(titles(&all), vec!["Sunrise", "Ocean View", "Sunset"]);

        model.apply_filter(ArtworkFilter::query("sun")).await.unwrap();
        let first = model.snapshot().visible.clone();
        assert_eq!(titles(&first), vec!["Sunrise", "Sunset"]);

        model.apply_filter(ArtworkFilter::query("sun")).await.unwrap();
        assert_eq!(model.snapshot().visible, first);
    }

    #[tokio::test]
    async fn test_category_filter() {
        let (_db, pool) = create_test_pool();
        let media = TempDir::new().unwrap();
        let (model, artist) = artwork_model(&pool, &media);
        model
            .insert(Artwork::new("Sunset", "", artist, "painting"))
            .await
            .unwrap();
        model
            .insert(Artwork::new("Harbour", "sun on water", artist, "photography"))
            .await
            .unwrap();

        let filter = ArtworkFilter {
            query: "SUN".to_string(),
            categories: BTreeSet::from(["Photography".to_string()]),
        };
        assert_eq!(model.apply_filter(filter).await.unwrap(), 1);
        assert_eq!(model.snapshot().visible[0].title, "Harbour");
    }

    #[tokio::test]
    async fn test_invalid_artwork_fills_error_slot() {
        let (_db, pool) = create_test_pool();
        let media = TempDir::new().unwrap();
        let (model, artist) = artwork_model(&pool, &media);

        let result = model.insert(Artwork::new("  ", "", artist, "painting")).await;
        assert!(matches!(result, Err(AppError::Domain(_))));

        let snapshot = model.snapshot();
        assert!(snapshot.items.is_empty());
        assert!(snapshot.error.is_some());
    }

    #[tokio::test]
    async fn test_full_event_stays_full() {
        let (_db, pool) = create_test_pool();
        let service = Arc::new(EventService::new(
            Arc::new(SqliteEventRepository::new(pool)),
            Arc::new(EventBus::new()),
        ));
        let model = ListModel::spawn(EventListSource::new(Arc::clone(&service)), 20);

        let start = Utc::now() + Duration::days(3);
        let event = model
            .insert(
                Event::new("Print fair", EventCategory::Exhibition, start, start + Duration::hours(6))
                    .with_capacity(10, 10),
            )
            .await
            .unwrap();

        assert!(!service.attend_enabled(&event));
        assert!(service.toggle_attendance(event.id).is_err());

        model.refresh().await.unwrap();
        let snapshot = model.snapshot();
        let stored = &snapshot.items[0];
        assert_eq!(stored.current_attendees, 10);
        assert!(!stored.is_user_attending);
    }

    #[tokio::test]
    async fn test_events_visible_by_start_date() {
        let (_db, pool) = create_test_pool();
        let service = Arc::new(EventService::new(
            Arc::new(SqliteEventRepository::new(pool)),
            Arc::new(EventBus::new()),
        ));
        let model = ListModel::spawn(EventListSource::new(Arc::clone(&service)), 20);

        let now = Utc::now();
        for (title, days) in [("Late", 10), ("Early", 1), ("Middle", 5)] {
            let start = now + Duration::days(days);
            model
                .insert(Event::new(title, EventCategory::Workshop, start, start + Duration::hours(2)))
                .await
                .unwrap();
        }

        model.apply_filter(EventFilter::default()).await.unwrap();
        let visible: Vec<String> = model
            .snapshot()
            .visible
            .iter()
            .map(|e| e.title.clone())
            .collect();
        assert_eq!(visible, vec!["Early", "Middle", "Late"]);

        let window = Some((now + Duration::days(4), now + Duration::days(6)));
        let filter = EventFilter {
            window,
            ..EventFilter::default()
        };
        assert_eq!(model.apply_filter(filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_pinned_posts_first() {
        let (_db, pool) = create_test_pool();
        let prefs_dir = TempDir::new().unwrap();
        let service = Arc::new(ForumService::new(
            Arc::new(SqliteForumPostRepository::new(Arc::clone(&pool))),
            Arc::new(SqliteForumCommentRepository::new(pool)),
            Arc::new(PreferencesStore::open(prefs_dir.path().join("preferences.json")).unwrap()),
            Arc::new(EventBus::new()),
        ));
        let model = ListModel::spawn(ForumListSource::new(Arc::clone(&service)), 20);

        let author = Author::new(None, "visitor");
        let rules = model
            .insert(ForumPost::new("Rules", "be kind", author.clone(), ForumCategory::General))
            .await
            .unwrap();
        model
            .insert(ForumPost::new("Glazes", "which?", author, ForumCategory::Techniques))
            .await
            .unwrap();

        service.set_pinned(rules.id, true).unwrap();
        model.refresh().await.unwrap();

        let titles: Vec<String> = model
            .snapshot()
            .visible
            .iter()
            .map(|p| p.title.clone())
            .collect();
        assert_eq!(titles, vec!["Rules", "Glazes"]);

        let filter = ForumFilter {
            category: Some(ForumCategory::Techniques),
            query: String::new(),
        };
        assert_eq!(model.apply_filter(filter).await.unwrap(), 1);
    }
}

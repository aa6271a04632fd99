// src/services/news_service.rs

use std::sync::Arc;

use crate::domain::{validate_news, ArtNews, RecordId};
use crate::error::{AppError, AppResult};
use crate::events::{EventBus, NewsPublished};
use crate::repositories::NewsRepository;

pub struct NewsService {
    news_repo: Arc<dyn NewsRepository>,
    event_bus: Arc<EventBus>,
}

impl NewsService {
    pub fn new(news_repo: Arc<dyn NewsRepository>, event_bus: Arc<EventBus>) -> Self {
        Self {
            news_repo,
            event_bus,
        }
    }

    pub fn publish(&self, mut news: ArtNews) -> AppResult<ArtNews> {
        validate_news(&news).map_err(AppError::Domain)?;
        news.id = self.news_repo.insert(&news)?;

        self.event_bus
            .emit(NewsPublished::new(news.id, news.title.clone()));
        Ok(news)
    }

    pub fn update_news(&self, news: &ArtNews) -> AppResult<()> {
        validate_news(news).map_err(AppError::Domain)?;
        self.news_repo.update(news)
    }

    pub fn delete_news(&self, id: RecordId) -> AppResult<()> {
        self.news_repo.delete(id)
    }

    pub fn get_news(&self, id: RecordId) -> AppResult<Option<ArtNews>> {
        self.news_repo.get_by_id(id)
    }

    /// Most recent first
    pub fn list_page(&self, limit: usize, offset: usize) -> AppResult<Vec<ArtNews>> {
        self.news_repo.list_page(limit, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::create_test_pool;
    use crate::repositories::SqliteNewsRepository;
    use chrono::{Duration, Utc};

    #[test]
    fn test_published_news_pages_newest_first() {
        let (_dir, pool) = create_test_pool();
        let service = NewsService::new(
            Arc::new(SqliteNewsRepository::new(pool)),
            Arc::new(EventBus::new()),
        );

        let now = Utc::now();
        service
            .publish(ArtNews::new("Biennale opens", "", now - Duration::days(2)))
            .unwrap();
        let latest = service
            .publish(ArtNews::new("Museum reopens", "", now))
            .unwrap();

        let page = service.list_page(1, 0).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, latest.id);

        assert!(service.publish(ArtNews::new("", "", now)).is_err());
    }
}

// src/repositories/performance_repository.rs

use rusqlite::{params, params_from_iter, Row};
use std::sync::Arc;

use crate::db::values::{encode_timestamp, get_parsed, get_timestamp};
use crate::db::ConnectionPool;
use crate::domain::{Performance, PerformanceCategory, RecordId};
use crate::error::{AppError, AppResult};
use crate::repositories::sql_filter::SqlFilter;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceCriteria {
    pub category: Option<PerformanceCategory>,
    pub artist_id: Option<RecordId>,
    pub downloaded_only: bool,
}

impl PerformanceCriteria {
    fn to_filter(&self) -> SqlFilter {
        let mut filter = SqlFilter::new();
        if let Some(category) = self.category {
            filter.eq("category", category.as_str().to_string());
        }
        if let Some(artist_id) = self.artist_id {
            filter.eq("artist_id", artist_id);
        }
        if self.downloaded_only {
            filter.raw("is_downloaded = 1");
        }
        filter
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait PerformanceRepository: Send + Sync {
    fn insert(&self, performance: &Performance) -> AppResult<RecordId>;
    /// Insert under a caller-chosen id, as bundled assets carry their own
    fn insert_with_id(&self, id: RecordId, performance: &Performance) -> AppResult<RecordId>;
    fn update(&self, performance: &Performance) -> AppResult<()>;
    fn delete(&self, id: RecordId) -> AppResult<()>;
    fn get_by_id(&self, id: RecordId) -> AppResult<Option<Performance>>;
    /// Most recently recorded first
    fn list(&self, criteria: &PerformanceCriteria) -> AppResult<Vec<Performance>>;
    fn list_page(
        &self,
        criteria: &PerformanceCriteria,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<Performance>>;
    fn increment_view_count(&self, id: RecordId) -> AppResult<()>;
    fn set_download(
        &self,
        id: RecordId,
        video_path: &str,
        thumbnail_path: &str,
        is_downloaded: bool,
    ) -> AppResult<()>;
}

pub struct SqlitePerformanceRepository {
    pool: Arc<ConnectionPool>,
}

const PERFORMANCE_COLUMNS: &str = "id, title, description, video_path, artist_id, duration, \
     thumbnail_path, category, date_recorded, view_count, is_downloaded";

impl SqlitePerformanceRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// `None` lets SQLite assign the id
    fn insert_row(&self, id: Option<RecordId>, p: &Performance) -> AppResult<RecordId> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO performances (title, description, video_path, artist_id, duration,
                 thumbnail_path, category, date_recorded, view_count, is_downloaded, id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                p.title,
                p.description,
                p.video_path,
                p.artist_id,
                p.duration,
                p.thumbnail_path,
                p.category.as_str(),
                encode_timestamp(&p.date_recorded),
                p.view_count,
                p.is_downloaded,
                id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn row_to_performance(row: &Row) -> Result<Performance, rusqlite::Error> {
        Ok(Performance {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            video_path: row.get("video_path")?,
            artist_id: row.get("artist_id")?,
            duration: row.get("duration")?,
            thumbnail_path: row.get("thumbnail_path")?,
            category: get_parsed(row, "category")?,
            date_recorded: get_timestamp(row, "date_recorded")?,
            view_count: row.get("view_count")?,
            is_downloaded: row.get("is_downloaded")?,
        })
    }
}

impl PerformanceRepository for SqlitePerformanceRepository {
    fn insert(&self, p: &Performance) -> AppResult<RecordId> {
        self.insert_row(None, p)
    }

    fn insert_with_id(&self, id: RecordId, p: &Performance) -> AppResult<RecordId> {
        self.insert_row(Some(id), p)
    }

    fn update(&self, p: &Performance) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE performances SET title = ?2, description = ?3, video_path = ?4, artist_id = ?5,
                 duration = ?6, thumbnail_path = ?7, category = ?8, date_recorded = ?9,
                 view_count = ?10, is_downloaded = ?11
             WHERE id = ?1",
            params![
                p.id,
                p.title,
                p.description,
                p.video_path,
                p.artist_id,
                p.duration,
                p.thumbnail_path,
                p.category.as_str(),
                encode_timestamp(&p.date_recorded),
                p.view_count,
                p.is_downloaded,
            ],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn delete(&self, id: RecordId) -> AppResult<()> {
        let conn = self.pool.get()?;
        if conn.execute("DELETE FROM performances WHERE id = ?1", params![id])? == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn get_by_id(&self, id: RecordId) -> AppResult<Option<Performance>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM performances WHERE id = ?1",
            PERFORMANCE_COLUMNS
        ))?;
        match stmt.query_row(params![id], Self::row_to_performance) {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn list(&self, criteria: &PerformanceCriteria) -> AppResult<Vec<Performance>> {
        let conn = self.pool.get()?;
        let filter = criteria.to_filter();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM performances{} ORDER BY date_recorded DESC, id DESC",
            PERFORMANCE_COLUMNS,
            filter.where_sql()
        ))?;
        let performances = stmt
            .query_map(params_from_iter(filter.values()), Self::row_to_performance)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(performances)
    }

    fn list_page(
        &self,
        criteria: &PerformanceCriteria,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<Performance>> {
        let conn = self.pool.get()?;
        let filter = criteria.to_filter();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM performances{} ORDER BY date_recorded DESC, id DESC LIMIT ? OFFSET ?",
            PERFORMANCE_COLUMNS,
            filter.where_sql()
        ))?;
        let performances = stmt
            .query_map(
                params_from_iter(filter.paged_values(limit, offset)),
                Self::row_to_performance,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(performances)
    }

    fn increment_view_count(&self, id: RecordId) -> AppResult<()> {
        let conn = self.pool.get()?;
        if conn.execute(
            "UPDATE performances SET view_count = view_count + 1 WHERE id = ?1",
            params![id],
        )? == 0
        {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn set_download(
        &self,
        id: RecordId,
        video_path: &str,
        thumbnail_path: &str,
        is_downloaded: bool,
    ) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE performances SET video_path = ?2, thumbnail_path = ?3, is_downloaded = ?4
             WHERE id = ?1",
            params![id, video_path, thumbnail_path, is_downloaded],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::create_test_pool;
    use crate::domain::Artist;
    use crate::repositories::{ArtistRepository, SqliteArtistRepository};
    use chrono::{Duration, Utc};

    #[test]
    fn test_downloaded_filter_and_order() {
        let (_dir, pool) = create_test_pool();
        let artist = SqliteArtistRepository::new(Arc::clone(&pool))
            .insert(&Artist::new("Zakir", ""))
            .unwrap();
        let repo = SqlitePerformanceRepository::new(pool);

        let mut older = Performance::new("Tabla solo", artist, PerformanceCategory::Music);
        older.date_recorded = Utc::now() - Duration::days(30);
        let older_id = repo.insert(&older).unwrap();
        repo.insert(&Performance::new("Kathak", artist, PerformanceCategory::Dance))
            .unwrap();

        let all = repo.list(&PerformanceCriteria::default()).unwrap();
        assert_eq!(all[0].title, "Kathak");

        repo.set_download(older_id, "/m/p.mp4", "/m/p.jpg", true).unwrap();
        let downloaded = repo
            .list(&PerformanceCriteria {
                downloaded_only: true,
                ..PerformanceCriteria::default()
            })
            .unwrap();
        assert_eq!(downloaded.len(), 1);
        assert_eq!(downloaded[0].id, older_id);
    }
}

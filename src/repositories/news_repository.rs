// src/repositories/news_repository.rs

use rusqlite::{params, Row};
use std::sync::Arc;

use crate::db::values::{encode_timestamp, get_timestamp};
use crate::db::ConnectionPool;
use crate::domain::{ArtNews, RecordId};
use crate::error::{AppError, AppResult};

pub trait NewsRepository: Send + Sync {
    fn insert(&self, news: &ArtNews) -> AppResult<RecordId>;
    fn update(&self, news: &ArtNews) -> AppResult<()>;
    fn delete(&self, id: RecordId) -> AppResult<()>;
    fn get_by_id(&self, id: RecordId) -> AppResult<Option<ArtNews>>;
    /// Newest first
    fn list_page(&self, limit: usize, offset: usize) -> AppResult<Vec<ArtNews>>;
}

pub struct SqliteNewsRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteNewsRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_news(row: &Row) -> Result<ArtNews, rusqlite::Error> {
        Ok(ArtNews {
            id: row.get("id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            date: get_timestamp(row, "date")?,
            image_path: row.get("image_path")?,
        })
    }
}

impl NewsRepository for SqliteNewsRepository {
    fn insert(&self, news: &ArtNews) -> AppResult<RecordId> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO art_news (title, content, date, image_path) VALUES (?1, ?2, ?3, ?4)",
            params![news.title, news.content, encode_timestamp(&news.date), news.image_path],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, news: &ArtNews) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE art_news SET title = ?2, content = ?3, date = ?4, image_path = ?5 WHERE id = ?1",
            params![
                news.id,
                news.title,
                news.content,
                encode_timestamp(&news.date),
                news.image_path
            ],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn delete(&self, id: RecordId) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM art_news WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn get_by_id(&self, id: RecordId) -> AppResult<Option<ArtNews>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, content, date, image_path FROM art_news WHERE id = ?1",
        )?;
        match stmt.query_row(params![id], Self::row_to_news) {
            Ok(news) => Ok(Some(news)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn list_page(&self, limit: usize, offset: usize) -> AppResult<Vec<ArtNews>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, content, date, image_path FROM art_news
             ORDER BY date DESC, id DESC LIMIT ?1 OFFSET ?2",
        )?;
        let news = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_news)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(news)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::create_test_pool;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_news_are_listed_newest_first() {
        let (_dir, pool) = create_test_pool();
        let repo = SqliteNewsRepository::new(pool);

        let older = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        repo.insert(&ArtNews::new("Biennale opens", "", older)).unwrap();
        repo.insert(&ArtNews::new("Museum reopens", "", newer)).unwrap();

        let page = repo.list_page(10, 0).unwrap();
        assert_eq!(page[0].title, "Museum reopens");
        assert_eq!(page[0].date, newer);
        assert_eq!(page[1].title, "Biennale opens");
    }
}

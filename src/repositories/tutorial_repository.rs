// src/repositories/tutorial_repository.rs

use rusqlite::{params, params_from_iter, Row};
use std::sync::Arc;

use crate::db::values::{encode_timestamp, get_parsed, get_timestamp};
use crate::db::ConnectionPool;
use crate::domain::{Difficulty, RecordId, Tutorial, TutorialCategory};
use crate::error::{AppError, AppResult};
use crate::repositories::sql_filter::SqlFilter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProgressFilter {
    #[default]
    Any,
    /// Started but not finished
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TutorialCriteria {
    pub category: Option<TutorialCategory>,
    pub difficulty: Option<Difficulty>,
    pub query: Option<String>,
    pub instructor_id: Option<RecordId>,
    pub downloaded_only: bool,
    pub progress: ProgressFilter,
}

impl TutorialCriteria {
    fn to_filter(&self) -> SqlFilter {
        let mut filter = SqlFilter::new();
        if let Some(category) = self.category {
            filter.eq("category", category.as_str().to_string());
        }
        if let Some(difficulty) = self.difficulty {
            filter.eq("difficulty", difficulty.as_str().to_string());
        }
        if let Some(query) = &self.query {
            filter.search(&["title", "description"], query);
        }
        if let Some(instructor) = self.instructor_id {
            filter.eq("instructor_id", instructor);
        }
        if self.downloaded_only {
            filter.raw("is_downloaded = 1");
        }
        match self.progress {
            ProgressFilter::Any => {}
            ProgressFilter::InProgress => {
                filter.raw("user_progress > 0 AND user_progress < 100");
            }
            ProgressFilter::Completed => {
                filter.raw("user_progress = 100");
            }
        }
        filter
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait TutorialRepository: Send + Sync {
    fn insert(&self, tutorial: &Tutorial) -> AppResult<RecordId>;
    fn update(&self, tutorial: &Tutorial) -> AppResult<()>;
    fn delete(&self, id: RecordId) -> AppResult<()>;
    fn get_by_id(&self, id: RecordId) -> AppResult<Option<Tutorial>>;
    /// Newest first
    fn list(&self, criteria: &TutorialCriteria) -> AppResult<Vec<Tutorial>>;
    fn list_page(
        &self,
        criteria: &TutorialCriteria,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<Tutorial>>;
    fn increment_view_count(&self, id: RecordId) -> AppResult<()>;
    fn set_progress(&self, id: RecordId, progress: u8) -> AppResult<()>;
    fn set_quiz_completed(&self, id: RecordId, completed: bool) -> AppResult<()>;
    fn set_download(
        &self,
        id: RecordId,
        video_path: &str,
        thumbnail_path: &str,
        is_downloaded: bool,
    ) -> AppResult<()>;
}

pub struct SqliteTutorialRepository {
    pool: Arc<ConnectionPool>,
}

const TUTORIAL_COLUMNS: &str = "id, title, description, video_path, instructor_id, duration, \
     thumbnail_path, category, difficulty, materials_needed, date_added, view_count, \
     is_downloaded, has_completed_quiz, user_progress";

impl SqliteTutorialRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_tutorial(row: &Row) -> Result<Tutorial, rusqlite::Error> {
        Ok(Tutorial {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            video_path: row.get("video_path")?,
            instructor_id: row.get("instructor_id")?,
            duration: row.get("duration")?,
            thumbnail_path: row.get("thumbnail_path")?,
            category: get_parsed(row, "category")?,
            difficulty: get_parsed(row, "difficulty")?,
            materials_needed: row.get("materials_needed")?,
            date_added: get_timestamp(row, "date_added")?,
            view_count: row.get("view_count")?,
            is_downloaded: row.get("is_downloaded")?,
            has_completed_quiz: row.get("has_completed_quiz")?,
            user_progress: row.get("user_progress")?,
        })
    }

    fn execute_one(&self, sql: &str, params: impl rusqlite::Params) -> AppResult<()> {
        let conn = self.pool.get()?;
        if conn.execute(sql, params)? == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

impl TutorialRepository for SqliteTutorialRepository {
    fn insert(&self, tutorial: &Tutorial) -> AppResult<RecordId> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO tutorials (title, description, video_path, instructor_id, duration,
                 thumbnail_path, category, difficulty, materials_needed, date_added, view_count,
                 is_downloaded, has_completed_quiz, user_progress)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                tutorial.title,
                tutorial.description,
                tutorial.video_path,
                tutorial.instructor_id,
                tutorial.duration,
                tutorial.thumbnail_path,
                tutorial.category.as_str(),
                tutorial.difficulty.as_str(),
                tutorial.materials_needed,
                encode_timestamp(&tutorial.date_added),
                tutorial.view_count,
                tutorial.is_downloaded,
                tutorial.has_completed_quiz,
                tutorial.user_progress,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, tutorial: &Tutorial) -> AppResult<()> {
        self.execute_one(
            "UPDATE tutorials SET title = ?2, description = ?3, video_path = ?4, instructor_id = ?5,
                 duration = ?6, thumbnail_path = ?7, category = ?8, difficulty = ?9,
                 materials_needed = ?10, date_added = ?11, view_count = ?12, is_downloaded = ?13,
                 has_completed_quiz = ?14, user_progress = ?15
             WHERE id = ?1",
            params![
                tutorial.id,
                tutorial.title,
                tutorial.description,
                tutorial.video_path,
                tutorial.instructor_id,
                tutorial.duration,
                tutorial.thumbnail_path,
                tutorial.category.as_str(),
                tutorial.difficulty.as_str(),
                tutorial.materials_needed,
                encode_timestamp(&tutorial.date_added),
                tutorial.view_count,
                tutorial.is_downloaded,
                tutorial.has_completed_quiz,
                tutorial.user_progress,
            ],
        )
    }

    fn delete(&self, id: RecordId) -> AppResult<()> {
        self.execute_one("DELETE FROM tutorials WHERE id = ?1", params![id])
    }

    fn get_by_id(&self, id: RecordId) -> AppResult<Option<Tutorial>> {
        let conn = self.pool.get()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM tutorials WHERE id = ?1", TUTORIAL_COLUMNS))?;
        match stmt.query_row(params![id], Self::row_to_tutorial) {
            Ok(t) => Ok(Some(t)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn list(&self, criteria: &TutorialCriteria) -> AppResult<Vec<Tutorial>> {
        let conn = self.pool.get()?;
        let filter = criteria.to_filter();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tutorials{} ORDER BY date_added DESC, id DESC",
            TUTORIAL_COLUMNS,
            filter.where_sql()
        ))?;
        let tutorials = stmt
            .query_map(params_from_iter(filter.values()), Self::row_to_tutorial)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tutorials)
    }

    fn list_page(
        &self,
        criteria: &TutorialCriteria,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<Tutorial>> {
        let conn = self.pool.get()?;
        let filter = criteria.to_filter();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tutorials{} ORDER BY date_added DESC, id DESC LIMIT ? OFFSET ?",
            TUTORIAL_COLUMNS,
            filter.where_sql()
        ))?;
        let tutorials = stmt
            .query_map(
                params_from_iter(filter.paged_values(limit, offset)),
                Self::row_to_tutorial,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tutorials)
    }

    fn increment_view_count(&self, id: RecordId) -> AppResult<()> {
        self.execute_one(
            "UPDATE tutorials SET view_count = view_count + 1 WHERE id = ?1",
            params![id],
        )
    }

    fn set_progress(&self, id: RecordId, progress: u8) -> AppResult<()> {
        self.execute_one(
            "UPDATE tutorials SET user_progress = ?2 WHERE id = ?1",
            params![id, progress],
        )
    }

    fn set_quiz_completed(&self, id: RecordId, completed: bool) -> AppResult<()> {
        self.execute_one(
            "UPDATE tutorials SET has_completed_quiz = ?2 WHERE id = ?1",
            params![id, completed],
        )
    }

    fn set_download(
        &self,
        id: RecordId,
        video_path: &str,
        thumbnail_path: &str,
        is_downloaded: bool,
    ) -> AppResult<()> {
        self.execute_one(
            "UPDATE tutorials SET video_path = ?2, thumbnail_path = ?3, is_downloaded = ?4
             WHERE id = ?1",
            params![id, video_path, thumbnail_path, is_downloaded],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::create_test_pool;
    use crate::domain::Artist;
    use crate::repositories::{ArtistRepository, SqliteArtistRepository};

    fn setup() -> (tempfile::TempDir, SqliteTutorialRepository, RecordId) {
        let (dir, pool) = create_test_pool();
        let instructor = SqliteArtistRepository::new(Arc::clone(&pool))
            .insert(&Artist::new("K. G. Subramanyan", ""))
            .unwrap();
        (dir, SqliteTutorialRepository::new(pool), instructor)
    }

    #[test]
    fn test_progress_filters() {
        let (_dir, repo, instructor) = setup();
        let a = repo
            .insert(&Tutorial::new("Terracotta", instructor, TutorialCategory::Sculpture, Difficulty::Beginner))
            .unwrap();
        let b = repo
            .insert(&Tutorial::new("Murals", instructor, TutorialCategory::Painting, Difficulty::Advanced))
            .unwrap();
        repo.insert(&Tutorial::new("Ink", instructor, TutorialCategory::Drawing, Difficulty::Beginner))
            .unwrap();

        repo.set_progress(a, 40).unwrap();
        repo.set_progress(b, 100).unwrap();

        let in_progress = repo
            .list(&TutorialCriteria {
                progress: ProgressFilter::InProgress,
                ..TutorialCriteria::default()
            })
            .unwrap();
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].id, a);

        let completed = repo
            .list(&TutorialCriteria {
                progress: ProgressFilter::Completed,
                ..TutorialCriteria::default()
            })
            .unwrap();
        assert_eq!(completed[0].id, b);

        let beginner = repo
            .list(&TutorialCriteria {
                difficulty: Some(Difficulty::Beginner),
                ..TutorialCriteria::default()
            })
            .unwrap();
        assert_eq!(beginner.len(), 2);
    }

    #[test]
    fn test_progress_above_100_is_rejected_by_schema() {
        let (_dir, repo, instructor) = setup();
        let id = repo
            .insert(&Tutorial::new("Terracotta", instructor, TutorialCategory::Sculpture, Difficulty::Beginner))
            .unwrap();
        assert!(repo.set_progress(id, 150).is_err());
    }

    #[test]
    fn test_download_flag_and_views() {
        let (_dir, repo, instructor) = setup();
        let id = repo
            .insert(&Tutorial::new("Glazes", instructor, TutorialCategory::Sculpture, Difficulty::Intermediate))
            .unwrap();
        repo.set_download(id, "/m/tutorial_1.mp4", "/m/t_1.jpg", true).unwrap();
        repo.increment_view_count(id).unwrap();
        repo.set_quiz_completed(id, true).unwrap();

        let stored = repo.get_by_id(id).unwrap().unwrap();
        assert!(stored.is_downloaded);
        assert!(stored.has_completed_quiz);
        assert_eq!(stored.view_count, 1);
        assert_eq!(stored.video_path, "/m/tutorial_1.mp4");
    }
}

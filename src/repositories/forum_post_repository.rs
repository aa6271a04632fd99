// src/repositories/forum_post_repository.rs
//
// Forum post persistence. Listing puts pinned posts first, then newest.

use rusqlite::{params, params_from_iter, Row};
use std::sync::Arc;

use crate::db::values::{
    encode_optional_timestamp, encode_timestamp, get_optional_timestamp, get_parsed,
    get_timestamp,
};
use crate::db::ConnectionPool;
use crate::domain::{Author, ForumCategory, ForumPost, RecordId};
use crate::error::{AppError, AppResult};
use crate::repositories::sql_filter::SqlFilter;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostCriteria {
    pub category: Option<ForumCategory>,
    pub query: Option<String>,
    pub author_id: Option<RecordId>,
    pub pending_sync_only: bool,
}

impl PostCriteria {
    fn to_filter(&self) -> SqlFilter {
        let mut filter = SqlFilter::new();
        if let Some(category) = self.category {
            filter.eq("category", category.as_str().to_string());
        }
        if let Some(query) = &self.query {
            filter.search(&["title", "content", "tags"], query);
        }
        if let Some(author_id) = self.author_id {
            filter.eq("author_id", author_id);
        }
        if self.pending_sync_only {
            filter.raw("pending_sync_to_server = 1");
        }
        filter
    }
}

/// Counter columns that change by small deltas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostCounter {
    Likes,
    Views,
}

impl PostCounter {
    fn column(&self) -> &'static str {
        match self {
            PostCounter::Likes => "like_count",
            PostCounter::Views => "view_count",
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait ForumPostRepository: Send + Sync {
    fn insert(&self, post: &ForumPost) -> AppResult<RecordId>;
    /// Rewrites the editable fields; counters are left alone
    fn update(&self, post: &ForumPost) -> AppResult<()>;
    /// Removes the post and all of its comments in one transaction
    fn delete(&self, id: RecordId) -> AppResult<()>;
    fn get_by_id(&self, id: RecordId) -> AppResult<Option<ForumPost>>;
    fn list(&self, criteria: &PostCriteria) -> AppResult<Vec<ForumPost>>;
    fn list_page(
        &self,
        criteria: &PostCriteria,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<ForumPost>>;
    fn count(&self, criteria: &PostCriteria) -> AppResult<i64>;
    /// Adds `delta` to a counter, clamped at zero
    fn adjust_counter(&self, id: RecordId, counter: PostCounter, delta: i64) -> AppResult<()>;
    fn set_pinned(&self, id: RecordId, pinned: bool) -> AppResult<()>;
    fn set_locked(&self, id: RecordId, locked: bool) -> AppResult<()>;
    fn mark_synced(&self, id: RecordId) -> AppResult<()>;
}

pub struct SqliteForumPostRepository {
    pool: Arc<ConnectionPool>,
}

const POST_COLUMNS: &str = "id, title, content, author_id, author_name, category, created_at, \
     last_edited_at, image_path, like_count, view_count, comment_count, is_pinned, is_locked, \
     tags, pending_sync_to_server";

const POST_ORDER: &str = "ORDER BY is_pinned DESC, created_at DESC, id DESC";

impl SqliteForumPostRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_post(row: &Row) -> Result<ForumPost, rusqlite::Error> {
        let tags: Option<String> = row.get("tags")?;
        Ok(ForumPost {
            id: row.get("id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            author: Author {
                id: row.get("author_id")?,
                name: row.get("author_name")?,
            },
            category: get_parsed(row, "category")?,
            created_at: get_timestamp(row, "created_at")?,
            last_edited_at: get_optional_timestamp(row, "last_edited_at")?,
            image_path: row.get("image_path")?,
            like_count: row.get("like_count")?,
            view_count: row.get("view_count")?,
            comment_count: row.get("comment_count")?,
            is_pinned: row.get("is_pinned")?,
            is_locked: row.get("is_locked")?,
            tags: ForumPost::decode_tags(tags.as_deref()),
            pending_sync_to_server: row.get("pending_sync_to_server")?,
        })
    }

    fn set_flag(&self, id: RecordId, column: &str, value: bool) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            &format!("UPDATE forum_posts SET {} = ?2 WHERE id = ?1", column),
            params![id, value],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

impl ForumPostRepository for SqliteForumPostRepository {
    fn insert(&self, post: &ForumPost) -> AppResult<RecordId> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO forum_posts (title, content, author_id, author_name, category, created_at,
                 last_edited_at, image_path, like_count, view_count, comment_count, is_pinned,
                 is_locked, tags, pending_sync_to_server)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                post.title,
                post.content,
                post.author.id,
                post.author.name,
                post.category.as_str(),
                encode_timestamp(&post.created_at),
                encode_optional_timestamp(&post.last_edited_at),
                post.image_path,
                post.like_count,
                post.view_count,
                post.comment_count,
                post.is_pinned,
                post.is_locked,
                post.encoded_tags(),
                post.pending_sync_to_server,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, post: &ForumPost) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE forum_posts SET title = ?2, content = ?3, category = ?4, last_edited_at = ?5,
                 image_path = ?6, tags = ?7, pending_sync_to_server = ?8
             WHERE id = ?1",
            params![
                post.id,
                post.title,
                post.content,
                post.category.as_str(),
                encode_optional_timestamp(&post.last_edited_at),
                post.image_path,
                post.encoded_tags(),
                post.pending_sync_to_server,
            ],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn delete(&self, id: RecordId) -> AppResult<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM forum_comments WHERE post_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM forum_posts WHERE id = ?1", params![id])?;
        if rows == 0 {
            // Dropping the transaction rolls back
            return Err(AppError::NotFound);
        }
        tx.commit()?;
        Ok(())
    }

    fn get_by_id(&self, id: RecordId) -> AppResult<Option<ForumPost>> {
        let conn = self.pool.get()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM forum_posts WHERE id = ?1", POST_COLUMNS))?;
        match stmt.query_row(params![id], Self::row_to_post) {
            Ok(post) => Ok(Some(post)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn list(&self, criteria: &PostCriteria) -> AppResult<Vec<ForumPost>> {
        let conn = self.pool.get()?;
        let filter = criteria.to_filter();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM forum_posts{} {}",
            POST_COLUMNS,
            filter.where_sql(),
            POST_ORDER
        ))?;
        let posts = stmt
            .query_map(params_from_iter(filter.values()), Self::row_to_post)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    fn list_page(
        &self,
        criteria: &PostCriteria,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<ForumPost>> {
        let conn = self.pool.get()?;
        let filter = criteria.to_filter();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM forum_posts{} {} LIMIT ? OFFSET ?",
            POST_COLUMNS,
            filter.where_sql(),
            POST_ORDER
        ))?;
        let posts = stmt
            .query_map(
                params_from_iter(filter.paged_values(limit, offset)),
                Self::row_to_post,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    fn count(&self, criteria: &PostCriteria) -> AppResult<i64> {
        let conn = self.pool.get()?;
        let filter = criteria.to_filter();
        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM forum_posts{}", filter.where_sql()),
            params_from_iter(filter.values()),
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn adjust_counter(&self, id: RecordId, counter: PostCounter, delta: i64) -> AppResult<()> {
        let conn = self.pool.get()?;
        let column = counter.column();
        let rows = conn.execute(
            &format!(
                "UPDATE forum_posts SET {col} = MAX({col} + ?2, 0) WHERE id = ?1",
                col = column
            ),
            params![id, delta],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn set_pinned(&self, id: RecordId, pinned: bool) -> AppResult<()> {
        self.set_flag(id, "is_pinned", pinned)
    }

    fn set_locked(&self, id: RecordId, locked: bool) -> AppResult<()> {
        self.set_flag(id, "is_locked", locked)
    }

    fn mark_synced(&self, id: RecordId) -> AppResult<()> {
        self.set_flag(id, "pending_sync_to_server", false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::create_test_pool;
    use chrono::{Duration, Utc};

    fn post(title: &str, minutes_ago: i64) -> ForumPost {
        let mut post = ForumPost::new(title, "body", Author::new(None, "Meera"), ForumCategory::General);
        post.created_at = Utc::now() - Duration::minutes(minutes_ago);
        post
    }

    #[test]
    fn test_pinned_first_then_newest() {
        let (_dir, pool) = create_test_pool();
        let repo = SqliteForumPostRepository::new(pool);
        repo.insert(&post("old", 30)).unwrap();
        let pinned = repo.insert(&post("rules", 600)).unwrap();
        repo.insert(&post("new", 1)).unwrap();
        repo.set_pinned(pinned, true).unwrap();

        let titles: Vec<String> = repo
            .list(&PostCriteria::default())
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["rules", "new", "old"]);
    }

    #[test]
    fn test_counters_never_go_negative() {
        let (_dir, pool) = create_test_pool();
        let repo = SqliteForumPostRepository::new(pool);
        let id = repo.insert(&post("p", 0)).unwrap();

        repo.adjust_counter(id, PostCounter::Likes, 1).unwrap();
        repo.adjust_counter(id, PostCounter::Likes, -1).unwrap();
        repo.adjust_counter(id, PostCounter::Likes, -1).unwrap();
        repo.adjust_counter(id, PostCounter::Views, 1).unwrap();

        let stored = repo.get_by_id(id).unwrap().unwrap();
        assert_eq!(stored.like_count, 0);
        assert_eq!(stored.view_count, 1);
    }

    #[test]
    fn test_delete_removes_comments() {
        let (_dir, pool) = create_test_pool();
        let repo = SqliteForumPostRepository::new(Arc::clone(&pool));
        let id = repo.insert(&post("p", 0)).unwrap();
        {
            let conn = pool.get().unwrap();
            conn.execute(
                "INSERT INTO forum_comments (post_id, content, author_name, created_at)
                 VALUES (?1, 'hi', 'Ravi', '2025-01-01T00:00:00.000Z')",
                params![id],
            )
            .unwrap();
        }

        repo.delete(id).unwrap();

        let conn = pool.get().unwrap();
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM forum_comments", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
        assert!(matches!(repo.delete(id), Err(AppError::NotFound)));
    }

    #[test]
    fn test_pending_sync_and_search() {
        let (_dir, pool) = create_test_pool();
        let repo = SqliteForumPostRepository::new(pool);
        let mut pending = post("Glazing tips", 0).with_tags(["oil"]);
        pending.pending_sync_to_server = true;
        let id = repo.insert(&pending).unwrap();
        repo.insert(&post("Charcoal", 0)).unwrap();

        let only_pending = PostCriteria {
            pending_sync_only: true,
            ..PostCriteria::default()
        };
        assert_eq!(repo.count(&only_pending).unwrap(), 1);
        repo.mark_synced(id).unwrap();
        assert_eq!(repo.count(&only_pending).unwrap(), 0);

        let by_tag = PostCriteria {
            query: Some("oil".to_string()),
            ..PostCriteria::default()
        };
        assert_eq!(repo.list(&by_tag).unwrap()[0].tags, vec!["oil"]);
    }
}

// src/repositories/forum_comment_repository.rs
//
// Comment persistence. Inserting or deleting a comment also maintains the
// post's comment count and the parent's reply count, in the same transaction.

use rusqlite::{params, OptionalExtension, Row};
use std::sync::Arc;

use crate::db::values::{encode_optional_timestamp, encode_timestamp, get_optional_timestamp, get_timestamp};
use crate::db::ConnectionPool;
use crate::domain::{Author, ForumComment, RecordId};
use crate::error::{AppError, AppResult};

#[cfg_attr(test, mockall::automock)]
pub trait ForumCommentRepository: Send + Sync {
    fn insert(&self, comment: &ForumComment) -> AppResult<RecordId>;
    fn update(&self, comment: &ForumComment) -> AppResult<()>;
    /// Deletes the comment and its replies. Returns how many rows went.
    fn delete(&self, id: RecordId) -> AppResult<usize>;
    fn get_by_id(&self, id: RecordId) -> AppResult<Option<ForumComment>>;
    /// Top-level comments of a post, oldest first
    fn list_for_post(&self, post_id: RecordId) -> AppResult<Vec<ForumComment>>;
    fn list_replies(&self, parent_id: RecordId) -> AppResult<Vec<ForumComment>>;
    /// Image paths of the comment and every reply beneath it
    fn subtree_images(&self, id: RecordId) -> AppResult<Vec<String>>;
    /// Image paths of every comment on the post, replies included
    fn images_for_post(&self, post_id: RecordId) -> AppResult<Vec<String>>;
    fn list_pending_sync(&self) -> AppResult<Vec<ForumComment>>;
    fn count_for_post(&self, post_id: RecordId) -> AppResult<i64>;
    fn adjust_likes(&self, id: RecordId, delta: i64) -> AppResult<()>;
    fn mark_synced(&self, id: RecordId) -> AppResult<()>;
}

pub struct SqliteForumCommentRepository {
    pool: Arc<ConnectionPool>,
}

const COMMENT_COLUMNS: &str = "id, post_id, content, author_id, author_name, created_at, \
     last_edited_at, image_path, like_count, parent_comment_id, is_edited, \
     pending_sync_to_server, reply_count";

impl SqliteForumCommentRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_comment(row: &Row) -> Result<ForumComment, rusqlite::Error> {
        Ok(ForumComment {
            id: row.get("id")?,
            post_id: row.get("post_id")?,
            content: row.get("content")?,
            author: Author {
                id: row.get("author_id")?,
                name: row.get("author_name")?,
            },
            created_at: get_timestamp(row, "created_at")?,
            last_edited_at: get_optional_timestamp(row, "last_edited_at")?,
            image_path: row.get("image_path")?,
            like_count: row.get("like_count")?,
            parent_comment_id: row.get("parent_comment_id")?,
            is_edited: row.get("is_edited")?,
            pending_sync_to_server: row.get("pending_sync_to_server")?,
            reply_count: row.get("reply_count")?,
        })
    }

    fn image_paths(&self, sql: &str, param: RecordId) -> AppResult<Vec<String>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(sql)?;
        let paths = stmt
            .query_map(params![param], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(paths)
    }

    fn select(&self, where_sql: &str, param: Option<RecordId>) -> AppResult<Vec<ForumComment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM forum_comments {} ORDER BY created_at ASC, id ASC",
            COMMENT_COLUMNS, where_sql
        ))?;
        let comments = match param {
            Some(p) => stmt.query_map(params![p], Self::row_to_comment)?,
            None => stmt.query_map([], Self::row_to_comment)?,
        }
        .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }
}

impl ForumCommentRepository for SqliteForumCommentRepository {
    fn insert(&self, comment: &ForumComment) -> AppResult<RecordId> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO forum_comments (post_id, content, author_id, author_name, created_at,
                 last_edited_at, image_path, like_count, parent_comment_id, is_edited,
                 pending_sync_to_server, reply_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0)",
            params![
                comment.post_id,
                comment.content,
                comment.author.id,
                comment.author.name,
                encode_timestamp(&comment.created_at),
                encode_optional_timestamp(&comment.last_edited_at),
                comment.image_path,
                comment.like_count,
                comment.parent_comment_id,
                comment.is_edited,
                comment.pending_sync_to_server,
            ],
        )?;
        let id = tx.last_insert_rowid();

        tx.execute(
            "UPDATE forum_posts SET comment_count = comment_count + 1 WHERE id = ?1",
            params![comment.post_id],
        )?;
        if let Some(parent) = comment.parent_comment_id {
            tx.execute(
                "UPDATE forum_comments SET reply_count = reply_count + 1 WHERE id = ?1",
                params![parent],
            )?;
        }

        tx.commit()?;
        Ok(id)
    }

    fn update(&self, comment: &ForumComment) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE forum_comments SET content = ?2, last_edited_at = ?3, image_path = ?4,
                 is_edited = ?5, pending_sync_to_server = ?6
             WHERE id = ?1",
            params![
                comment.id,
                comment.content,
                encode_optional_timestamp(&comment.last_edited_at),
                comment.image_path,
                comment.is_edited,
                comment.pending_sync_to_server,
            ],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn delete(&self, id: RecordId) -> AppResult<usize> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let target: Option<(RecordId, Option<RecordId>)> = tx
            .query_row(
                "SELECT post_id, parent_comment_id FROM forum_comments WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (post_id, parent) = target.ok_or(AppError::NotFound)?;

        let removed: i64 = tx.query_row(
            "WITH RECURSIVE subtree(id) AS (
                 SELECT ?1
                 UNION ALL
                 SELECT c.id FROM forum_comments c JOIN subtree s ON c.parent_comment_id = s.id
             )
             SELECT COUNT(*) FROM subtree",
            params![id],
            |row| row.get(0),
        )?;

        // Replies go with the parent through the foreign key cascade
        tx.execute("DELETE FROM forum_comments WHERE id = ?1", params![id])?;
        tx.execute(
            "UPDATE forum_posts SET comment_count = MAX(comment_count - ?2, 0) WHERE id = ?1",
            params![post_id, removed],
        )?;
        if let Some(parent) = parent {
            tx.execute(
                "UPDATE forum_comments SET reply_count = MAX(reply_count - 1, 0) WHERE id = ?1",
                params![parent],
            )?;
        }

        tx.commit()?;
        Ok(removed as usize)
    }

    fn get_by_id(&self, id: RecordId) -> AppResult<Option<ForumComment>> {
        Ok(self.select("WHERE id = ?1", Some(id))?.into_iter().next())
    }

    fn list_for_post(&self, post_id: RecordId) -> AppResult<Vec<ForumComment>> {
        self.select("WHERE post_id = ?1 AND parent_comment_id IS NULL", Some(post_id))
    }

    fn list_replies(&self, parent_id: RecordId) -> AppResult<Vec<ForumComment>> {
        self.select("WHERE parent_comment_id = ?1", Some(parent_id))
    }

    fn subtree_images(&self, id: RecordId) -> AppResult<Vec<String>> {
        self.image_paths(
            "WITH RECURSIVE subtree(id) AS (
                 SELECT ?1
                 UNION ALL
                 SELECT c.id FROM forum_comments c JOIN subtree s ON c.parent_comment_id = s.id
             )
             SELECT c.image_path FROM forum_comments c JOIN subtree s ON c.id = s.id
             WHERE c.image_path IS NOT NULL",
            id,
        )
    }

    fn images_for_post(&self, post_id: RecordId) -> AppResult<Vec<String>> {
        self.image_paths(
            "SELECT image_path FROM forum_comments
             WHERE post_id = ?1 AND image_path IS NOT NULL
             ORDER BY id ASC",
            post_id,
        )
    }

    fn list_pending_sync(&self) -> AppResult<Vec<ForumComment>> {
        self.select("WHERE pending_sync_to_server = 1", None)
    }

    fn count_for_post(&self, post_id: RecordId) -> AppResult<i64> {
        let conn = self.pool.get()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM forum_comments WHERE post_id = ?1",
            params![post_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn adjust_likes(&self, id: RecordId, delta: i64) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE forum_comments SET like_count = MAX(like_count + ?2, 0) WHERE id = ?1",
            params![id, delta],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn mark_synced(&self, id: RecordId) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE forum_comments SET pending_sync_to_server = 0 WHERE id = ?1",
            params![id],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

// src/services/forum_service.rs
//
// Community forum: posts, threaded comments, likes and sync bookkeeping.
//
// RULES:
// - Created or edited posts and comments are marked pending sync
// - Locked posts refuse new comments
// - A reply must belong to the same post as its parent
// - The liked-post set is stored in preferences; the like counter follows it

use chrono::Utc;
use std::sync::Arc;

use crate::domain::{
    validate_comment, validate_post, DomainError, ForumComment, ForumPost, RecordId,
};
use crate::error::{AppError, AppResult};
use crate::events::{
    EventBus, ForumCommentAdded, ForumCommentDeleted, ForumPostCreated, ForumPostDeleted,
    ForumPostLikeToggled, MediaFilesReleased,
};
use crate::infrastructure::PreferencesStore;
use crate::repositories::{
    ForumCommentRepository, ForumPostRepository, PostCounter, PostCriteria,
};

pub struct ForumService {
    post_repo: Arc<dyn ForumPostRepository>,
    comment_repo: Arc<dyn ForumCommentRepository>,
    preferences: Arc<PreferencesStore>,
    event_bus: Arc<EventBus>,
}

impl ForumService {
    pub fn new(
        post_repo: Arc<dyn ForumPostRepository>,
        comment_repo: Arc<dyn ForumCommentRepository>,
        preferences: Arc<PreferencesStore>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            post_repo,
            comment_repo,
            preferences,
            event_bus,
        }
    }

    // ========================================================================
    // POSTS
    // ========================================================================

    pub fn create_post(&self, mut post: ForumPost) -> AppResult<ForumPost> {
        post.pending_sync_to_server = true;
        validate_post(&post).map_err(AppError::Domain)?;
        post.id = self.post_repo.insert(&post)?;

        self.event_bus
            .emit(ForumPostCreated::new(post.id, post.category.to_string()));
        Ok(post)
    }

    /// Save edits to title, content, category, image and tags
    pub fn edit_post(&self, post: &ForumPost) -> AppResult<ForumPost> {
        let mut next = post.clone();
        next.last_edited_at = Some(Utc::now());
        next.pending_sync_to_server = true;
        validate_post(&next).map_err(AppError::Domain)?;

        self.post_repo.update(&next)?;
        Ok(next)
    }

    pub fn delete_post(&self, id: RecordId) -> AppResult<()> {
        let post = self.require_post(id)?;
        let comment_images = self.comment_repo.images_for_post(id)?;

        self.post_repo.delete(id)?;
        if let Err(e) = self.preferences.forget_post(id) {
            log::warn!("Could not drop like for deleted post {}: {}", id, e);
        }

        self.event_bus.emit(ForumPostDeleted::new(id));
        let mut images: Vec<String> = post.image_path.into_iter().collect();
        images.extend(comment_images);
        if !images.is_empty() {
            self.event_bus
                .emit(MediaFilesReleased::new(format!("forum post {}", id), images));
        }
        Ok(())
    }

    pub fn get_post(&self, id: RecordId) -> AppResult<Option<ForumPost>> {
        self.post_repo.get_by_id(id)
    }

    /// Count a view and return the post as stored afterwards
    pub fn view_post(&self, id: RecordId) -> AppResult<ForumPost> {
        self.post_repo.adjust_counter(id, PostCounter::Views, 1)?;
        self.require_post(id)
    }

    pub fn list_posts(&self, criteria: &PostCriteria) -> AppResult<Vec<ForumPost>> {
        self.post_repo.list(criteria)
    }

    /// Pinned first, then newest
    pub fn list_page(
        &self,
        criteria: &PostCriteria,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<ForumPost>> {
        self.post_repo.list_page(criteria, limit, offset)
    }

    pub fn search_posts(&self, query: &str) -> AppResult<Vec<ForumPost>> {
        self.post_repo.list(&PostCriteria {
            query: Some(query.to_string()),
            ..PostCriteria::default()
        })
    }

    pub fn is_liked(&self, post_id: RecordId) -> bool {
        self.preferences.is_liked(post_id)
    }

    /// Flip the user's like. The preference is written first; if the
    /// counter update fails it is put back.
    pub fn toggle_like(&self, post_id: RecordId) -> AppResult<ForumPost> {
        self.require_post(post_id)?;
        let liked = !self.preferences.is_liked(post_id);
        self.preferences.set_liked(post_id, liked)?;

        let delta = if liked { 1 } else { -1 };
        if let Err(e) = self
            .post_repo
            .adjust_counter(post_id, PostCounter::Likes, delta)
        {
            if let Err(undo) = self.preferences.set_liked(post_id, !liked) {
                log::error!("Like state for post {} is out of sync: {}", post_id, undo);
            }
            return Err(e);
        }

        self.event_bus
            .emit(ForumPostLikeToggled::new(post_id, liked));
        self.require_post(post_id)
    }

    pub fn set_pinned(&self, post_id: RecordId, pinned: bool) -> AppResult<()> {
        self.post_repo.set_pinned(post_id, pinned)
    }

    pub fn set_locked(&self, post_id: RecordId, locked: bool) -> AppResult<()> {
        self.post_repo.set_locked(post_id, locked)
    }

    pub fn posts_pending_sync(&self) -> AppResult<Vec<ForumPost>> {
        self.post_repo.list(&PostCriteria {
            pending_sync_only: true,
            ..PostCriteria::default()
        })
    }

    pub fn mark_post_synced(&self, post_id: RecordId) -> AppResult<()> {
        self.post_repo.mark_synced(post_id)
    }

    // ========================================================================
    // COMMENTS
    // ========================================================================

    /// Add a comment or reply; the post's comment count moves with it
    pub fn add_comment(&self, mut comment: ForumComment) -> AppResult<ForumComment> {
        validate_comment(&comment).map_err(AppError::Domain)?;

        let post = self.require_post(comment.post_id)?;
        if post.is_locked {
            return Err(AppError::Domain(DomainError::PostLocked(post.id)));
        }
        if let Some(parent_id) = comment.parent_comment_id {
            let parent = self
                .comment_repo
                .get_by_id(parent_id)?
                .ok_or_else(|| {
                    AppError::Domain(DomainError::NotFound(format!("comment {}", parent_id)))
                })?;
            if parent.post_id != comment.post_id {
                return Err(AppError::Domain(DomainError::InvariantViolation(format!(
                    "Comment {} belongs to another post",
                    parent_id
                ))));
            }
        }

        comment.pending_sync_to_server = true;
        comment.id = self.comment_repo.insert(&comment)?;

        self.event_bus.emit(ForumCommentAdded::new(
            comment.id,
            comment.post_id,
            comment.parent_comment_id,
        ));
        Ok(comment)
    }

    pub fn edit_comment(&self, comment_id: RecordId, content: &str) -> AppResult<ForumComment> {
        let mut comment = self
            .comment_repo
            .get_by_id(comment_id)?
            .ok_or(AppError::NotFound)?;
        comment.content = content.to_string();
        comment.is_edited = true;
        comment.last_edited_at = Some(Utc::now());
        comment.pending_sync_to_server = true;
        validate_comment(&comment).map_err(AppError::Domain)?;

        self.comment_repo.update(&comment)?;
        Ok(comment)
    }

    /// Delete a comment with its replies; returns how many were removed
    pub fn delete_comment(&self, comment_id: RecordId) -> AppResult<usize> {
        let comment = self
            .comment_repo
            .get_by_id(comment_id)?
            .ok_or(AppError::NotFound)?;
        let images = self.comment_repo.subtree_images(comment_id)?;
        let removed = self.comment_repo.delete(comment_id)?;

        self.event_bus.emit(ForumCommentDeleted::new(
            comment_id,
            comment.post_id,
            removed,
        ));
        if !images.is_empty() {
            self.event_bus.emit(MediaFilesReleased::new(
                format!("comment {}", comment_id),
                images,
            ));
        }
        Ok(removed)
    }

    /// Top-level comments, oldest first
    pub fn comments_for_post(&self, post_id: RecordId) -> AppResult<Vec<ForumComment>> {
        self.comment_repo.list_for_post(post_id)
    }

    pub fn replies(&self, comment_id: RecordId) -> AppResult<Vec<ForumComment>> {
        self.comment_repo.list_replies(comment_id)
    }

    pub fn like_comment(&self, comment_id: RecordId) -> AppResult<()> {
        self.comment_repo.adjust_likes(comment_id, 1)
    }

    pub fn comments_pending_sync(&self) -> AppResult<Vec<ForumComment>> {
        self.comment_repo.list_pending_sync()
    }

    pub fn mark_comment_synced(&self, comment_id: RecordId) -> AppResult<()> {
        self.comment_repo.mark_synced(comment_id)
    }

    fn require_post(&self, id: RecordId) -> AppResult<ForumPost> {
        self.post_repo.get_by_id(id)?.ok_or(AppError::NotFound)
    }
}

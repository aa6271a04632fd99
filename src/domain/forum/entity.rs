use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{labelled_enum, RecordId, UNSAVED_ID};

labelled_enum! {
    ForumCategory, "forum category" {
        General => "general",
        Techniques => "techniques",
        Critique => "critique",
        Events => "events",
        Marketplace => "marketplace",
        Collaboration => "collaboration",
    }
}

/// Who wrote a post or comment. `id` links to an artist profile when the
/// writer has one; the display name is kept even if that profile is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: Option<RecordId>,
    pub name: String,
}

impl Author {
    pub fn new(id: Option<RecordId>, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn anonymous() -> Self {
        Self::new(None, "Anonymous")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumPost {
    pub id: RecordId,
    pub title: String,
    pub content: String,
    pub author: Author,
    pub category: ForumCategory,
    pub created_at: DateTime<Utc>,
    pub last_edited_at: Option<DateTime<Utc>>,
    pub image_path: Option<String>,
    pub like_count: i64,
    pub view_count: i64,
    pub comment_count: i64,
    pub is_pinned: bool,
    pub is_locked: bool,
    pub tags: Vec<String>,
    /// Local change not yet pushed to a server
    pub pending_sync_to_server: bool,
}

impl ForumPost {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        author: Author,
        category: ForumCategory,
    ) -> Self {
        Self {
            id: UNSAVED_ID,
            title: title.into(),
            content: content.into(),
            author,
            category,
            created_at: Utc::now(),
            last_edited_at: None,
            image_path: None,
            like_count: 0,
            view_count: 0,
            comment_count: 0,
            is_pinned: false,
            is_locked: false,
            tags: Vec::new(),
            pending_sync_to_server: false,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return true;
        }
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.content.to_lowercase().contains(&needle)
            || self.tags.iter().any(|t| t.to_lowercase() == needle)
    }

    /// Tags as stored: comma separated, None when empty
    pub fn encoded_tags(&self) -> Option<String> {
        if self.tags.is_empty() {
            None
        } else {
            Some(self.tags.join(","))
        }
    }

    pub fn decode_tags(raw: Option<&str>) -> Vec<String> {
        raw.map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumComment {
    pub id: RecordId,
    pub post_id: RecordId,
    pub content: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub last_edited_at: Option<DateTime<Utc>>,
    pub image_path: Option<String>,
    pub like_count: i64,
    /// Set for replies
    pub parent_comment_id: Option<RecordId>,
    pub is_edited: bool,
    pub pending_sync_to_server: bool,
    pub reply_count: i64,
}

impl ForumComment {
    pub fn new(post_id: RecordId, content: impl Into<String>, author: Author) -> Self {
        Self {
            id: UNSAVED_ID,
            post_id,
            content: content.into(),
            author,
            created_at: Utc::now(),
            last_edited_at: None,
            image_path: None,
            like_count: 0,
            parent_comment_id: None,
            is_edited: false,
            pending_sync_to_server: true,
            reply_count: 0,
        }
    }

    pub fn reply_to(mut self, parent_comment_id: RecordId) -> Self {
        self.parent_comment_id = Some(parent_comment_id);
        self
    }

    pub fn is_reply(&self) -> bool {
        self.parent_comment_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip_through_storage_form() {
        let post = ForumPost::new("t", "c", Author::anonymous(), ForumCategory::General)
            .with_tags(["oil", "glazing"]);
        assert_eq!(post.encoded_tags().as_deref(), Some("oil,glazing"));
        assert_eq!(ForumPost::decode_tags(Some("oil, glazing,,")), vec!["oil", "glazing"]);
        assert!(ForumPost::decode_tags(None).is_empty());
    }

    #[test]
    fn test_query_matches_tags_exactly() {
        let post = ForumPost::new("Layering", "thin coats", Author::anonymous(), ForumCategory::Techniques)
            .with_tags(["Oil"]);
        assert!(post.matches_query("oil"));
        assert!(post.matches_query("COATS"));
        assert!(!post.matches_query("watercolour"));
    }
}

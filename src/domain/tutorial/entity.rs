use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{labelled_enum, RecordId, UNSAVED_ID};

labelled_enum! {
    TutorialCategory, "tutorial category" {
        Painting => "painting",
        Drawing => "drawing",
        Sculpture => "sculpture",
        Digital => "digital",
        MixedMedia => "mixed_media",
    }
}

labelled_enum! {
    Difficulty, "difficulty" {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
}

/// Video lesson given by an instructor (an artist)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tutorial {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    /// Remote URL until downloaded, then the local file
    pub video_path: String,
    pub instructor_id: RecordId,
    /// Seconds
    pub duration: i64,
    pub thumbnail_path: String,
    pub category: TutorialCategory,
    pub difficulty: Difficulty,
    pub materials_needed: Option<String>,
    pub date_added: DateTime<Utc>,
    pub view_count: i64,
    pub is_downloaded: bool,
    pub has_completed_quiz: bool,
    /// Percent watched, 0..=100
    pub user_progress: u8,
}

impl Tutorial {
    pub fn new(
        title: impl Into<String>,
        instructor_id: RecordId,
        category: TutorialCategory,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            id: UNSAVED_ID,
            title: title.into(),
            description: String::new(),
            video_path: String::new(),
            instructor_id,
            duration: 0,
            thumbnail_path: String::new(),
            category,
            difficulty,
            materials_needed: None,
            date_added: Utc::now(),
            view_count: 0,
            is_downloaded: false,
            has_completed_quiz: false,
            user_progress: 0,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.user_progress > 0 && self.user_progress < 100
    }

    pub fn is_completed(&self) -> bool {
        self.user_progress >= 100
    }

    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return true;
        }
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

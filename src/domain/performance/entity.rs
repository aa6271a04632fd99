use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{labelled_enum, require_text, DomainError, DomainResult, RecordId, UNSAVED_ID};

labelled_enum! {
    PerformanceCategory, "performance category" {
        Music => "music",
        Dance => "dance",
        Theater => "theater",
        MixedMedia => "mixed_media",
    }
}

/// Recorded performance video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    pub video_path: String,
    pub artist_id: RecordId,
    /// Seconds
    pub duration: i64,
    pub thumbnail_path: String,
    pub category: PerformanceCategory,
    pub date_recorded: DateTime<Utc>,
    pub view_count: i64,
    pub is_downloaded: bool,
}

impl Performance {
    pub fn new(title: impl Into<String>, artist_id: RecordId, category: PerformanceCategory) -> Self {
        Self {
            id: UNSAVED_ID,
            title: title.into(),
            description: String::new(),
            video_path: String::new(),
            artist_id,
            duration: 0,
            thumbnail_path: String::new(),
            category,
            date_recorded: Utc::now(),
            view_count: 0,
            is_downloaded: false,
        }
    }
}

pub fn validate_performance(performance: &Performance) -> DomainResult<()> {
    require_text("Performance title", &performance.title)?;
    if performance.duration < 0 {
        return Err(DomainError::InvariantViolation(
            "Performance duration cannot be negative".to_string(),
        ));
    }
    Ok(())
}

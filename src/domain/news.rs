use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{require_text, DomainResult, RecordId, UNSAVED_ID};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtNews {
    pub id: RecordId,
    pub title: String,
    pub content: String,
    pub date: DateTime<Utc>,
    pub image_path: Option<String>,
}

impl ArtNews {
    pub fn new(title: impl Into<String>, content: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            id: UNSAVED_ID,
            title: title.into(),
            content: content.into(),
            date,
            image_path: None,
        }
    }
}

pub fn validate_news(news: &ArtNews) -> DomainResult<()> {
    require_text("News title", &news.title)
}

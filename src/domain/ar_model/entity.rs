use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{labelled_enum, RecordId, UNSAVED_ID};

labelled_enum! {
    ArCategory, "AR model category" {
        Sculpture => "sculpture",
        Painting => "painting",
        Installation => "installation",
        Character => "character",
        Furniture => "furniture",
        Abstract => "abstract",
    }
}

labelled_enum! {
    /// How a viewer may manipulate a placed model
    InteractionType, "interaction type" {
        Static => "static",
        Rotatable => "rotatable",
        Animated => "animated",
        Interactive => "interactive",
    }
}

/// Physical extent in metres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArModel {
    pub id: RecordId,
    pub name: String,
    pub description: String,
    pub model_file_path: String,
    pub thumbnail_path: String,
    pub artist_id: RecordId,
    /// Cleared if the artwork is deleted
    pub related_artwork_id: Option<RecordId>,
    pub category: ArCategory,
    pub scale: f64,
    pub date_added: DateTime<Utc>,
    /// Bytes on disk once downloaded
    pub file_size: u64,
    pub is_downloaded: bool,
    pub is_animated: bool,
    pub animation_duration_ms: Option<i64>,
    pub interaction_type: InteractionType,
    pub bounding_box: Option<BoundingBox>,
}

impl ArModel {
    pub fn new(name: impl Into<String>, artist_id: RecordId, category: ArCategory) -> Self {
        Self {
            id: UNSAVED_ID,
            name: name.into(),
            description: String::new(),
            model_file_path: String::new(),
            thumbnail_path: String::new(),
            artist_id,
            related_artwork_id: None,
            category,
            scale: 1.0,
            date_added: Utc::now(),
            file_size: 0,
            is_downloaded: false,
            is_animated: false,
            animation_duration_ms: None,
            interaction_type: InteractionType::Static,
            bounding_box: None,
        }
    }
}

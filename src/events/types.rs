// src/events/types.rs
//
// All domain events in the system.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events are immutable
// - Events carry only the data needed to react
// - Events are emitted only after the change is stored

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::RecordId;

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

/// Fills in `event_id`/`occurred_at` and implements `DomainEvent`
macro_rules! domain_event {
    (
        $(#[$meta:meta])*
        $name:ident { $($field:ident : $ty:ty),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Serialize, Deserialize)]
        pub struct $name {
            pub event_id: Uuid,
            pub occurred_at: DateTime<Utc>,
            $(pub $field: $ty,)*
        }

        impl $name {
            pub fn new($($field: $ty),*) -> Self {
                Self {
                    event_id: Uuid::new_v4(),
                    occurred_at: Utc::now(),
                    $($field,)*
                }
            }
        }

        impl DomainEvent for $name {
            fn event_id(&self) -> Uuid { self.event_id }
            fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
            fn event_type(&self) -> &'static str { stringify!($name) }
        }
    };
}

// ============================================================================
// CATALOGUE EVENTS
// ============================================================================

domain_event! {
    ArtistCreated { artist_id: RecordId, name: String }
}

domain_event! {
    /// The database already removed the artist's artworks
    ArtistDeleted { artist_id: RecordId, artworks_removed: usize }
}

domain_event! {
    ArtworkCreated { artwork_id: RecordId, artist_id: RecordId, title: String }
}

domain_event! {
    ArtworkUpdated { artwork_id: RecordId }
}

domain_event! {
    ArtworkDeleted { artwork_id: RecordId }
}

domain_event! {
    NewsPublished { news_id: RecordId, title: String }
}

domain_event! {
    MarketItemListed { item_id: RecordId, artwork_id: RecordId }
}

domain_event! {
    MarketAvailabilityChanged { item_id: RecordId, is_available: bool }
}

// ============================================================================
// EVENT CALENDAR EVENTS
// ============================================================================

domain_event! {
    GalleryEventScheduled { gallery_event_id: RecordId, title: String }
}

domain_event! {
    AttendanceChanged {
        gallery_event_id: RecordId,
        attending: bool,
        current_attendees: i64,
    }
}

domain_event! {
    /// `None` means the reminder was removed
    ReminderChanged {
        gallery_event_id: RecordId,
        title: String,
        reminder_time: Option<DateTime<Utc>>,
    }
}

// ============================================================================
// FORUM EVENTS
// ============================================================================

domain_event! {
    ForumPostCreated { post_id: RecordId, category: String }
}

domain_event! {
    ForumPostDeleted { post_id: RecordId }
}

domain_event! {
    ForumPostLikeToggled { post_id: RecordId, liked: bool }
}

domain_event! {
    ForumCommentAdded {
        comment_id: RecordId,
        post_id: RecordId,
        parent_comment_id: Option<RecordId>,
    }
}

domain_event! {
    /// `removed` counts the comment and all replies beneath it
    ForumCommentDeleted { comment_id: RecordId, post_id: RecordId, removed: usize }
}

// ============================================================================
// LEARNING & MEDIA EVENTS
// ============================================================================

domain_event! {
    TutorialProgressUpdated { tutorial_id: RecordId, progress: u8 }
}

domain_event! {
    /// Files that no record points at anymore
    MediaFilesReleased { owner: String, paths: Vec<String> }
}

domain_event! {
    MediaDownloadCompleted { owner: String, bytes: u64 }
}

domain_event! {
    MediaDownloadFailed { owner: String, reason: String }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_is_struct_name() {
        let event = ArtworkCreated::new(3, 1, "Sunset".to_string());
        assert_eq!(event.event_type(), "ArtworkCreated");
        assert_ne!(event.event_id(), Uuid::nil());
        assert_eq!(event.artwork_id, 3);
    }

    #[test]
    fn test_events_serialize() {
        let event = ReminderChanged::new(5, "Open studio".to_string(), None);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["gallery_event_id"], 5);
        assert!(json["reminder_time"].is_null());
    }
}

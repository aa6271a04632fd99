// src/events/mod.rs
//
// Internal Event System - Public API

pub mod bus;
pub mod handlers;
pub mod types;

pub use types::DomainEvent;

pub use types::{
    // Catalogue
    ArtistCreated,
    ArtistDeleted,
    ArtworkCreated,
    ArtworkDeleted,
    ArtworkUpdated,
    MarketAvailabilityChanged,
    MarketItemListed,
    NewsPublished,
    // Calendar
    AttendanceChanged,
    GalleryEventScheduled,
    ReminderChanged,
    // Forum
    ForumCommentAdded,
    ForumCommentDeleted,
    ForumPostCreated,
    ForumPostDeleted,
    ForumPostLikeToggled,
    // Learning & media
    MediaDownloadCompleted,
    MediaDownloadFailed,
    MediaFilesReleased,
    TutorialProgressUpdated,
};

pub use bus::{EventBus, EventLogEntry};

pub use handlers::register_media_cleanup_handlers;

/// Initialize a new event bus
pub fn create_event_bus() -> EventBus {
    EventBus::new()
}

// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic
// - NO invariant enforcement
// - NO event emission
// - Explicit SQL only
// - Multi-row bookkeeping (counters, cascades) happens inside one transaction

pub mod sql_filter;

pub mod artist_repository;
pub mod artwork_repository;
pub mod news_repository;
pub mod market_repository;
pub mod event_repository;
pub mod forum_post_repository;
pub mod forum_comment_repository;
pub mod tutorial_repository;
pub mod performance_repository;
pub mod ar_model_repository;

pub use sql_filter::SqlFilter;

pub use artist_repository::{ArtistRepository, SqliteArtistRepository};
pub use artwork_repository::{ArtworkCriteria, ArtworkRepository, SqliteArtworkRepository};
pub use news_repository::{NewsRepository, SqliteNewsRepository};
pub use market_repository::{MarketRepository, SqliteMarketRepository};
pub use event_repository::{EventCriteria, EventRepository, SqliteEventRepository};
pub use forum_post_repository::{
    ForumPostRepository, PostCounter, PostCriteria, SqliteForumPostRepository,
};
pub use forum_comment_repository::{ForumCommentRepository, SqliteForumCommentRepository};
pub use tutorial_repository::{
    ProgressFilter, SqliteTutorialRepository, TutorialCriteria, TutorialRepository,
};
pub use performance_repository::{
    PerformanceCriteria, PerformanceRepository, SqlitePerformanceRepository,
};
pub use ar_model_repository::{ArModelCriteria, ArModelRepository, SqliteArModelRepository};

#[cfg(test)]
pub use artist_repository::MockArtistRepository;
#[cfg(test)]
pub use artwork_repository::MockArtworkRepository;
#[cfg(test)]
pub use event_repository::MockEventRepository;
#[cfg(test)]
pub use forum_comment_repository::MockForumCommentRepository;
#[cfg(test)]
pub use forum_post_repository::MockForumPostRepository;
#[cfg(test)]
pub use tutorial_repository::MockTutorialRepository;

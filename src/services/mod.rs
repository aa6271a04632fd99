// src/services/mod.rs
//
// Services Module - Orchestration Layer
//
// RULES:
// - Services validate, then persist, then announce
// - A failed write leaves memory and disk as they were
// - Services never touch SQL directly

pub mod ar_model_service;
pub mod artist_service;
pub mod artwork_service;
pub mod event_service;
pub mod forum_service;
pub mod market_service;
pub mod media_downloader;
pub mod news_service;
pub mod performance_service;
pub mod tutorial_service;

pub use artist_service::ArtistService;
pub use artwork_service::ArtworkService;
pub use news_service::NewsService;
pub use market_service::MarketService;
pub use event_service::EventService;
pub use forum_service::ForumService;
pub use tutorial_service::TutorialService;
pub use performance_service::PerformanceService;
pub use ar_model_service::ArModelService;

pub use media_downloader::{
    run_blocking, DownloadRequest, DownloadStatus, DownloadedMedia, MediaDownloader,
};

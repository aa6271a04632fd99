// src/lib.rs
// ArtGallery - Local-first art catalogue
//
// Architecture:
// - Domain-centric: entities and their invariants live in `domain`
// - Repositories own SQL; services own rules, files and events
// - Event-driven: services announce changes on a synchronous bus
// - Application layer: actor-backed list models a UI binds to
// - Explicit: the database handle is built by `app`, never global

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod infrastructure;
pub mod repositories;
pub mod services;

// ============================================================================
// APPLICATION LAYER
// ============================================================================

pub mod app;
pub mod application;

// ============================================================================
// PUBLIC API - Domain Entities
// ============================================================================

pub use domain::{
    validate_ar_model,
    validate_artist,
    validate_artwork,
    validate_comment,
    validate_event,
    validate_market_item,
    validate_news,
    validate_performance,
    validate_post,
    validate_tutorial,
    // AR
    ArCategory,
    ArModel,
    // Catalogue
    ArtNews,
    Artist,
    Artwork,
    // Forum
    Author,
    BoundingBox,
    Difficulty,
    DomainError,
    // Calendar
    Event,
    EventCategory,
    ForumCategory,
    ForumComment,
    ForumPost,
    InteractionType,
    MarketItem,
    // Media
    Performance,
    PerformanceCategory,
    RecordId,
    Tutorial,
    TutorialCategory,
    UNSAVED_ID,
};

// ============================================================================
// PUBLIC API - Errors, Config, Database
// ============================================================================

pub use config::CatalogConfig;
pub use db::{create_connection_pool, initialize_database, ConnectionPool, Database};
pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{create_event_bus, DomainEvent, EventBus, EventLogEntry};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    ArModelService, ArtistService, ArtworkService, DownloadStatus, EventService, ForumService,
    MarketService, MediaDownloader, NewsService, PerformanceService, TutorialService,
};

// ============================================================================
// PUBLIC API - Application Layer
// ============================================================================

pub use app::Catalog;
pub use application::{AppState, ErrorResponse, ErrorType, ListModel, ListSnapshot, ListSource};

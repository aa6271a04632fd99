// src/application/mod.rs
//
// Application Layer
//
// ARCHITECTURE:
// - Sits above the services and below any UI
// - List models are the view-models a screen binds to
// - Errors reach the UI as ErrorResponse, never as raw AppError

pub mod error_handling;
pub mod list_model;
pub mod sources;
pub mod state;

pub use error_handling::{ErrorResponse, ErrorType};
pub use list_model::{ListModel, ListSnapshot, ListSource, SnapshotOf};
pub use sources::{
    ArModelFilter, ArModelListSource, ArtworkFilter, ArtworkListSource, EventFilter,
    EventListSource, ForumFilter, ForumListSource, PerformanceFilter, PerformanceListSource,
    TutorialFilter, TutorialListSource,
};
pub use state::AppState;

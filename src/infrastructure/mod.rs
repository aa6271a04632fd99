// src/infrastructure/mod.rs
//
// Infrastructure Layer
//
// File system and network plumbing that supports the services
// but holds no catalogue rules.
//
// RULES:
// - Infrastructure serves the services
// - Infrastructure never dictates domain behavior
// - Infrastructure is replaceable

pub mod media_source;
pub mod media_store;
pub mod preferences;

pub use media_source::{HttpMediaSource, InMemoryMediaSource, MediaBody, MediaSource};
pub use media_store::{is_image_file, MediaKind, MediaStore, PreloadedAsset};
pub use preferences::{Preferences, PreferencesStore};

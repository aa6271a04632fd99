// src/events/handlers/mod.rs
//
// Event Handlers
//
// Handlers use closure-based subscription via EventBus::subscribe.
// Only registration functions are exported.

pub mod media_cleanup_handler;

pub use media_cleanup_handler::register_media_cleanup_handlers;

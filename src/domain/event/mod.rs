pub mod entity;
pub mod invariants;

pub use entity::{Event, EventCategory};
pub use invariants::validate_event;

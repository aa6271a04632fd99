pub mod entity;
pub mod invariants;

pub use entity::{ArCategory, ArModel, BoundingBox, InteractionType};
pub use invariants::validate_ar_model;

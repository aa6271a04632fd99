pub mod entity;
pub mod invariants;

pub use entity::{Artwork, ARTWORK_CATEGORIES};
pub use invariants::validate_artwork;

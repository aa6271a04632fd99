pub mod entity;
pub mod invariants;

pub use entity::{Difficulty, Tutorial, TutorialCategory};
pub use invariants::validate_tutorial;

pub mod entity;
pub mod invariants;

pub use entity::{Author, ForumCategory, ForumComment, ForumPost};
pub use invariants::{validate_comment, validate_post};

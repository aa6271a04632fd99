// src/domain/mod.rs
//
// Domain Root - entities, value types and invariants.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod ar_model;
pub mod artist;
pub mod artwork;
pub mod event;
pub mod forum;
pub mod market;
pub mod news;
pub mod performance;
pub mod tutorial;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use artist::{validate_artist, Artist};
pub use artwork::{validate_artwork, Artwork, ARTWORK_CATEGORIES};
pub use news::{validate_news, ArtNews};
pub use market::{validate_market_item, MarketItem};

pub use event::{validate_event, Event, EventCategory};
pub use forum::{
    validate_comment, validate_post, Author, ForumCategory, ForumComment, ForumPost,
};
pub use tutorial::{validate_tutorial, Difficulty, Tutorial, TutorialCategory};
pub use performance::{validate_performance, Performance, PerformanceCategory};
pub use ar_model::{validate_ar_model, ArCategory, ArModel, BoundingBox, InteractionType};

/// Row identifier. `0` means the record has not been stored yet.
pub type RecordId = i64;

pub const UNSAVED_ID: RecordId = 0;

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Event {event_id} is full ({max_attendees} attendees)")]
    EventFull { event_id: RecordId, max_attendees: i64 },

    #[error("Forum post {0} is locked")]
    PostLocked(RecordId),

    #[error("Entity not found: {0}")]
    NotFound(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;

/// A stored label that matched no known variant
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown {kind} '{value}'")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

/// Closed set of lowercase labels, persisted as text.
///
/// Generates `as_str`, `ALL`, `Display` and `FromStr`.
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::domain::UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($label => Ok($name::$variant),)+
                    _ => Err($crate::domain::UnknownLabel {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

pub(crate) use labelled_enum;

/// Shared check: a required text field must not be blank
pub(crate) fn require_text(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::InvariantViolation(format!(
            "{} cannot be empty",
            field
        )));
    }
    Ok(())
}

/// Shared check: an optional amount must be finite and non-negative
pub(crate) fn require_amount(field: &str, value: Option<f64>) -> DomainResult<()> {
    if let Some(v) = value {
        if !v.is_finite() || v < 0.0 {
            return Err(DomainError::InvariantViolation(format!(
                "{} must be a non-negative amount, got {}",
                field, v
            )));
        }
    }
    Ok(())
}

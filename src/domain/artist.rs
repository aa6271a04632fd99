use serde::{Deserialize, Serialize};

use crate::domain::{require_text, DomainResult, RecordId, UNSAVED_ID};

/// A creator. Owns artworks, tutorials, performances and AR models;
/// deleting an artist removes all of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: RecordId,
    pub name: String,
    pub bio: String,
    pub profile_picture_path: String,
}

impl Artist {
    pub fn new(name: impl Into<String>, bio: impl Into<String>) -> Self {
        Self {
            id: UNSAVED_ID,
            name: name.into(),
            bio: bio.into(),
            profile_picture_path: String::new(),
        }
    }

    pub fn with_profile_picture(mut self, path: impl Into<String>) -> Self {
        self.profile_picture_path = path.into();
        self
    }
}

pub fn validate_artist(artist: &Artist) -> DomainResult<()> {
    require_text("Artist name", &artist.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_is_rejected() {
        assert!(validate_artist(&Artist::new("  ", "bio")).is_err());
        assert!(validate_artist(&Artist::new("Raja Ravi Varma", "")).is_ok());
    }
}

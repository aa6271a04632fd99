// src/infrastructure/preferences.rs
//
// Small JSON key-value store for per-user choices that have no table,
// currently the set of liked forum posts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::RecordId;
use crate::error::AppResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub liked_post_ids: BTreeSet<RecordId>,
}

pub struct PreferencesStore {
    path: PathBuf,
    state: Mutex<Preferences>,
}

impl PreferencesStore {
    /// Load from `path`; a missing file means empty preferences
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let state = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            Preferences::default()
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, Preferences> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_liked(&self, post_id: RecordId) -> bool {
        self.lock().liked_post_ids.contains(&post_id)
    }

    pub fn liked_post_ids(&self) -> BTreeSet<RecordId> {
        self.lock().liked_post_ids.clone()
    }

    /// Record the like state; returns whether anything changed.
    /// The file is written before the in-memory set changes.
    pub fn set_liked(&self, post_id: RecordId, liked: bool) -> AppResult<bool> {
        let mut state = self.lock();
        if state.liked_post_ids.contains(&post_id) == liked {
            return Ok(false);
        }

        let mut next = state.clone();
        if liked {
            next.liked_post_ids.insert(post_id);
        } else {
            next.liked_post_ids.remove(&post_id);
        }
        self.write(&next)?;
        *state = next;
        Ok(true)
    }

    /// Drop a post that no longer exists
    pub fn forget_post(&self, post_id: RecordId) -> AppResult<()> {
        self.set_liked(post_id, false).map(|_| ())
    }

    fn write(&self, prefs: &Preferences) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(prefs)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_likes_persist_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");

        let store = PreferencesStore::open(&path).unwrap();
        assert!(!store.is_liked(4));
        assert!(store.set_liked(4, true).unwrap());
        assert!(!store.set_liked(4, true).unwrap());
        store.set_liked(9, true).unwrap();

        let reopened = PreferencesStore::open(&path).unwrap();
        assert!(reopened.is_liked(4));
        assert_eq!(reopened.liked_post_ids().len(), 2);

        reopened.forget_post(4).unwrap();
        assert!(!PreferencesStore::open(&path).unwrap().is_liked(4));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "[oops").unwrap();
        assert!(PreferencesStore::open(&path).is_err());
    }
}

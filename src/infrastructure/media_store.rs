// src/infrastructure/media_store.rs
//
// Media Store
//
// Per-feature directory tree under the configured media root.
//
// RULES:
// - File names derive from record ids, never from user input alone
// - Removal never fails a record operation; problems are logged
// - Only files inside the media root are ever removed

use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::domain::RecordId;
use crate::error::{AppError, AppResult};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp"];

/// Directories of the media tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    ArtworkImage,
    Performance,
    PerformanceThumbnail,
    Tutorial,
    TutorialThumbnail,
    ArModel,
    ArThumbnail,
}

impl MediaKind {
    pub const ALL: &'static [MediaKind] = &[
        MediaKind::ArtworkImage,
        MediaKind::Performance,
        MediaKind::PerformanceThumbnail,
        MediaKind::Tutorial,
        MediaKind::TutorialThumbnail,
        MediaKind::ArModel,
        MediaKind::ArThumbnail,
    ];

    pub fn dir_name(&self) -> &'static str {
        match self {
            MediaKind::ArtworkImage => "artwork_images",
            MediaKind::Performance => "performances",
            MediaKind::PerformanceThumbnail => "performance_thumbnails",
            MediaKind::Tutorial => "tutorials",
            MediaKind::TutorialThumbnail => "tutorial_thumbnails",
            MediaKind::ArModel => "ar_models",
            MediaKind::ArThumbnail => "ar_thumbnails",
        }
    }
}

/// A media file found in a directory of bundled assets,
/// named `<id>_<name>.<ext>` with an optional `<id>_<name>.jpg` beside it
#[derive(Debug, Clone, PartialEq)]
pub struct PreloadedAsset {
    pub id: RecordId,
    pub name: String,
    pub media_path: PathBuf,
    pub thumbnail_path: Option<PathBuf>,
    pub file_size: u64,
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root and every per-feature directory
    pub fn ensure_layout(&self) -> AppResult<()> {
        for kind in MediaKind::ALL {
            fs::create_dir_all(self.dir(*kind))?;
        }
        log::debug!("Media store ready at {}", self.root.display());
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, kind: MediaKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    pub fn performance_video_path(&self, id: RecordId) -> PathBuf {
        self.dir(MediaKind::Performance)
            .join(format!("performance_{}.mp4", id))
    }

    pub fn performance_thumbnail_path(&self, id: RecordId) -> PathBuf {
        self.dir(MediaKind::PerformanceThumbnail)
            .join(format!("performance_thumbnail_{}.jpg", id))
    }

    pub fn tutorial_video_path(&self, id: RecordId) -> PathBuf {
        self.dir(MediaKind::Tutorial).join(format!("tutorial_{}.mp4", id))
    }

    pub fn tutorial_thumbnail_path(&self, id: RecordId) -> PathBuf {
        self.dir(MediaKind::TutorialThumbnail)
            .join(format!("tutorial_thumbnail_{}.jpg", id))
    }

    pub fn ar_model_path(&self, id: RecordId, name: &str) -> PathBuf {
        self.dir(MediaKind::ArModel)
            .join(format!("{}_{}.glb", id, file_safe_name(name)))
    }

    pub fn ar_thumbnail_path(&self, id: RecordId, name: &str) -> PathBuf {
        self.dir(MediaKind::ArThumbnail)
            .join(format!("{}_{}.jpg", id, file_safe_name(name)))
    }

    /// Sibling path a download streams into before the final rename
    pub fn partial_path(target: &Path) -> PathBuf {
        let mut name = target
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.part", Uuid::new_v4().simple()));
        target.with_file_name(name)
    }

    /// Copy a picked image into `artwork_images/` under a fresh name
    pub fn import_image(&self, source: &Path) -> AppResult<PathBuf> {
        if !is_image_file(source) {
            return Err(AppError::Other(format!(
                "Not an image file: {}",
                source.display()
            )));
        }
        if !source.is_file() {
            return Err(AppError::Other(format!(
                "Image not found: {}",
                source.display()
            )));
        }

        let ext = extension_of(source).unwrap_or_else(|| "jpg".to_string());
        let dir = self.dir(MediaKind::ArtworkImage);
        fs::create_dir_all(&dir)?;

        let target = dir.join(format!("{}.{}", Uuid::new_v4(), ext));
        fs::copy(source, &target)?;
        log::debug!("Imported image {} -> {}", source.display(), target.display());
        Ok(target)
    }

    /// Remove a stored file. Missing files, paths outside the store and
    /// I/O failures are logged and reported as `false`.
    pub fn remove(&self, path: &Path) -> bool {
        if path.as_os_str().is_empty() {
            return false;
        }
        if !path.starts_with(&self.root) {
            log::debug!("Not removing {}: outside the media store", path.display());
            return false;
        }
        match fs::remove_file(path) {
            Ok(()) => {
                log::debug!("Removed media file {}", path.display());
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                log::warn!("Failed to remove media file {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Remove every non-empty path in the list; returns how many were removed
    pub fn remove_all<'a>(&self, paths: impl IntoIterator<Item = &'a str>) -> usize {
        paths
            .into_iter()
            .filter(|p| !p.is_empty())
            .filter(|p| self.remove(Path::new(p)))
            .count()
    }

    /// Bytes used by one directory of the tree
    pub fn disk_usage(&self, kind: MediaKind) -> u64 {
        WalkDir::new(self.dir(kind))
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.metadata().ok())
            .map(|m| m.len())
            .sum()
    }

    /// Scan a directory of bundled assets with the given media extension
    pub fn discover_preloaded(dir: &Path, extension: &str) -> Vec<PreloadedAsset> {
        let mut assets: Vec<PreloadedAsset> = WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| extension_of(e.path()).as_deref() == Some(extension))
            .filter_map(|e| {
                let stem = e.path().file_stem()?.to_str()?.to_string();
                let (id, name) = stem.split_once('_')?;
                let id: RecordId = id.parse().ok()?;
                let thumbnail = e.path().with_extension("jpg");
                Some(PreloadedAsset {
                    id,
                    name: name.to_string(),
                    media_path: e.path().to_path_buf(),
                    thumbnail_path: thumbnail.is_file().then_some(thumbnail),
                    file_size: e.metadata().map(|m| m.len()).unwrap_or(0),
                })
            })
            .collect();

        assets.sort_by_key(|a| a.id);
        assets
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

pub fn is_image_file(path: &Path) -> bool {
    extension_of(path)
        .map(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
        .unwrap_or(false)
}

/// Lowercase, spaces to underscores, anything else unusual dropped
fn file_safe_name(name: &str) -> String {
    name.trim()
        .chars()
        .filter_map(|c| match c {
            c if c.is_alphanumeric() => Some(c.to_ascii_lowercase()),
            ' ' | '_' | '-' => Some('_'),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_and_naming() {
        let dir = TempDir::new().unwrap();
        let store = MediaStore::new(dir.path());
        store.ensure_layout().unwrap();

        for kind in MediaKind::ALL {
            assert!(store.dir(*kind).is_dir());
        }
        assert!(store
            .performance_thumbnail_path(7)
            .ends_with("performance_thumbnails/performance_thumbnail_7.jpg"));
        assert!(store.tutorial_video_path(3).ends_with("tutorials/tutorial_3.mp4"));
        assert!(store
            .ar_model_path(12, "Dancing Girl")
            .ends_with("ar_models/12_dancing_girl.glb"));
    }

    #[test]
    fn test_import_image_copies_into_store() {
        let dir = TempDir::new().unwrap();
        let store = MediaStore::new(dir.path().join("media"));
        let source = dir.path().join("picked.PNG");
        fs::write(&source, b"png").unwrap();

        let imported = store.import_image(&source).unwrap();
        assert!(imported.starts_with(store.dir(MediaKind::ArtworkImage)));
        assert_eq!(imported.extension().unwrap(), "png");
        assert!(source.exists());

        assert!(store.import_image(&dir.path().join("notes.txt")).is_err());
    }

    #[test]
    fn test_remove_only_inside_root() {
        let dir = TempDir::new().unwrap();
        let store = MediaStore::new(dir.path().join("media"));
        store.ensure_layout().unwrap();

        let inside = store.tutorial_video_path(1);
        fs::write(&inside, b"video").unwrap();
        let outside = dir.path().join("keep.jpg");
        fs::write(&outside, b"img").unwrap();

        assert!(store.remove(&inside));
        assert!(!inside.exists());
        assert!(!store.remove(&outside));
        assert!(outside.exists());
        assert!(!store.remove(&inside));
    }

    #[test]
    fn test_discover_preloaded_assets() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("2_vase.glb"), b"glb-bytes").unwrap();
        fs::write(dir.path().join("2_vase.jpg"), b"jpg").unwrap();
        fs::write(dir.path().join("1_chair.glb"), b"glb").unwrap();
        fs::write(dir.path().join("readme.glb"), b"x").unwrap();

        let assets = MediaStore::discover_preloaded(dir.path(), "glb");
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].id, 1);
        assert_eq!(assets[0].thumbnail_path, None);
        assert_eq!(assets[1].name, "vase");
        assert_eq!(assets[1].file_size, 9);
        assert!(assets[1].thumbnail_path.is_some());
    }

    #[test]
    fn test_disk_usage() {
        let dir = TempDir::new().unwrap();
        let store = MediaStore::new(dir.path());
        store.ensure_layout().unwrap();
        fs::write(store.performance_video_path(1), vec![0u8; 100]).unwrap();
        fs::write(store.performance_video_path(2), vec![0u8; 50]).unwrap();
        assert_eq!(store.disk_usage(MediaKind::Performance), 150);
        assert_eq!(store.disk_usage(MediaKind::Tutorial), 0);
    }
}

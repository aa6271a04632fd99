// src/events/handlers/media_cleanup_handler.rs
//
// Removes media files once the records pointing at them are gone.
//
// RULES:
// - Runs only for MediaFilesReleased, which services emit after the delete
//   has been stored
// - Never fails: unremovable files are logged by the store

use std::path::Path;
use std::sync::Arc;

use crate::events::types::MediaFilesReleased;
use crate::events::EventBus;
use crate::infrastructure::MediaStore;

pub fn register_media_cleanup_handlers(bus: &EventBus, store: Arc<MediaStore>) {
    bus.subscribe::<MediaFilesReleased, _>(move |event| {
        handle_media_released(&store, event);
    });

    log::debug!("Media cleanup handlers registered");
}

fn handle_media_released(store: &MediaStore, event: &MediaFilesReleased) {
    let mut removed = 0;
    for path in event.paths.iter().filter(|p| !p.is_empty()) {
        if store.remove(Path::new(path)) {
            removed += 1;
        }
    }
    log::info!(
        "Released media for {}: {} of {} files removed",
        event.owner,
        removed,
        event.paths.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_released_files_are_removed() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MediaStore::new(dir.path()));
        store.ensure_layout().unwrap();
        let video = store.performance_video_path(1);
        std::fs::write(&video, b"mp4").unwrap();

        let bus = EventBus::new();
        register_media_cleanup_handlers(&bus, Arc::clone(&store));

        bus.emit(MediaFilesReleased::new(
            "performance 1".to_string(),
            vec![video.to_string_lossy().into_owned(), String::new()],
        ));

        assert!(!video.exists());
    }
}

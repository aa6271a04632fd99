// src/repositories/artist_repository.rs
//
// Artist persistence

use rusqlite::{params, Row};
use std::sync::Arc;

use crate::db::ConnectionPool;
use crate::domain::{Artist, RecordId};
use crate::error::{AppError, AppResult};

#[cfg_attr(test, mockall::automock)]
pub trait ArtistRepository: Send + Sync {
    fn insert(&self, artist: &Artist) -> AppResult<RecordId>;
    fn update(&self, artist: &Artist) -> AppResult<()>;
    /// Removes the artist; the database cascades to everything they own
    fn delete(&self, id: RecordId) -> AppResult<()>;
    fn get_by_id(&self, id: RecordId) -> AppResult<Option<Artist>>;
    fn list_all(&self) -> AppResult<Vec<Artist>>;
    fn search(&self, query: &str) -> AppResult<Vec<Artist>>;
}

pub struct SqliteArtistRepository {
    pool: Arc<ConnectionPool>,
}

const ARTIST_COLUMNS: &str = "id, name, bio, profile_picture_path";

impl SqliteArtistRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_artist(row: &Row) -> Result<Artist, rusqlite::Error> {
        Ok(Artist {
            id: row.get("id")?,
            name: row.get("name")?,
            bio: row.get("bio")?,
            profile_picture_path: row.get("profile_picture_path")?,
        })
    }
}

impl ArtistRepository for SqliteArtistRepository {
    fn insert(&self, artist: &Artist) -> AppResult<RecordId> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO artists (name, bio, profile_picture_path) VALUES (?1, ?2, ?3)",
            params![artist.name, artist.bio, artist.profile_picture_path],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, artist: &Artist) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE artists SET name = ?2, bio = ?3, profile_picture_path = ?4 WHERE id = ?1",
            params![artist.id, artist.name, artist.bio, artist.profile_picture_path],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn delete(&self, id: RecordId) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM artists WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn get_by_id(&self, id: RecordId) -> AppResult<Option<Artist>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM artists WHERE id = ?1",
            ARTIST_COLUMNS
        ))?;

        match stmt.query_row(params![id], Self::row_to_artist) {
            Ok(artist) => Ok(Some(artist)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn list_all(&self) -> AppResult<Vec<Artist>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM artists ORDER BY name COLLATE NOCASE",
            ARTIST_COLUMNS
        ))?;
        let artists = stmt
            .query_map([], Self::row_to_artist)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artists)
    }

    fn search(&self, query: &str) -> AppResult<Vec<Artist>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM artists
             WHERE name LIKE ?1 ESCAPE '\\' OR bio LIKE ?1 ESCAPE '\\'
             ORDER BY name COLLATE NOCASE",
            ARTIST_COLUMNS
        ))?;
        let pattern = crate::db::values::like_pattern(query.trim());
        let artists = stmt
            .query_map(params![pattern], Self::row_to_artist)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::create_test_pool;

    #[test]
    fn test_insert_assigns_id_and_reads_back() {
        let (_dir, pool) = create_test_pool();
        let repo = SqliteArtistRepository::new(pool);

        let id = repo.insert(&Artist::new("Jamini Roy", "Bengal school")).unwrap();
        assert!(id > 0);

        let stored = repo.get_by_id(id).unwrap().unwrap();
        assert_eq!(stored.name, "Jamini Roy");
        assert_eq!(stored.bio, "Bengal school");
    }

    #[test]
    fn test_update_and_delete_missing_are_not_found() {
        let (_dir, pool) = create_test_pool();
        let repo = SqliteArtistRepository::new(pool);

        let mut ghost = Artist::new("Nobody", "");
        ghost.id = 4242;
        assert!(matches!(repo.update(&ghost), Err(AppError::NotFound)));
        assert!(matches!(repo.delete(4242), Err(AppError::NotFound)));
    }

    #[test]
    fn test_search_by_name_or_bio() {
        let (_dir, pool) = create_test_pool();
        let repo = SqliteArtistRepository::new(pool);
        repo.insert(&Artist::new("Tyeb Mehta", "Progressive group")).unwrap();
        repo.insert(&Artist::new("Nasreen Mohamedi", "Line drawings")).unwrap();

        let found = repo.search("progressive").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Tyeb Mehta");
        assert_eq!(repo.list_all().unwrap().len(), 2);
    }
}

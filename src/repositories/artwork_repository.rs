// src/repositories/artwork_repository.rs
//
// Artwork persistence. Listing order is newest first (id descending),
// which is also the page order the browse list relies on.

use rusqlite::{params, params_from_iter, Row};
use std::sync::Arc;

use crate::db::ConnectionPool;
use crate::domain::{Artwork, RecordId};
use crate::error::{AppError, AppResult};
use crate::repositories::sql_filter::SqlFilter;

/// Optional filters; all set fields must match
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtworkCriteria {
    pub query: Option<String>,
    pub categories: Vec<String>,
    pub artist_id: Option<RecordId>,
    pub for_sale_only: bool,
}

impl ArtworkCriteria {
    pub fn by_artist(artist_id: RecordId) -> Self {
        Self {
            artist_id: Some(artist_id),
            ..Self::default()
        }
    }

    pub fn for_sale() -> Self {
        Self {
            for_sale_only: true,
            ..Self::default()
        }
    }

    fn to_filter(&self) -> SqlFilter {
        let mut filter = SqlFilter::new();
        if let Some(query) = &self.query {
            filter.search(&["title", "description"], query);
        }
        filter.in_set("category", self.categories.iter().cloned());
        if let Some(artist_id) = self.artist_id {
            filter.eq("artist_id", artist_id);
        }
        if self.for_sale_only {
            filter.raw("is_for_sale = 1");
        }
        filter
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait ArtworkRepository: Send + Sync {
    fn insert(&self, artwork: &Artwork) -> AppResult<RecordId>;
    fn update(&self, artwork: &Artwork) -> AppResult<()>;
    fn delete(&self, id: RecordId) -> AppResult<()>;
    fn get_by_id(&self, id: RecordId) -> AppResult<Option<Artwork>>;
    fn list(&self, criteria: &ArtworkCriteria) -> AppResult<Vec<Artwork>>;
    fn list_page(
        &self,
        criteria: &ArtworkCriteria,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<Artwork>>;
    fn count(&self, criteria: &ArtworkCriteria) -> AppResult<i64>;
    fn list_categories(&self) -> AppResult<Vec<String>>;
}

pub struct SqliteArtworkRepository {
    pool: Arc<ConnectionPool>,
}

const ARTWORK_COLUMNS: &str = "id, title, description, image_path, artist_id, category, \
                               price, is_for_sale, contact_details";

impl SqliteArtworkRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_artwork(row: &Row) -> Result<Artwork, rusqlite::Error> {
        Ok(Artwork {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            image_path: row.get("image_path")?,
            artist_id: row.get("artist_id")?,
            category: row.get("category")?,
            price: row.get("price")?,
            is_for_sale: row.get("is_for_sale")?,
            contact_details: row.get("contact_details")?,
        })
    }
}

impl ArtworkRepository for SqliteArtworkRepository {
    fn insert(&self, artwork: &Artwork) -> AppResult<RecordId> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO artworks (title, description, image_path, artist_id, category,
                                   price, is_for_sale, contact_details)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                artwork.title,
                artwork.description,
                artwork.image_path,
                artwork.artist_id,
                artwork.category,
                artwork.price,
                artwork.is_for_sale,
                artwork.contact_details,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, artwork: &Artwork) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE artworks SET title = ?2, description = ?3, image_path = ?4, artist_id = ?5,
                    category = ?6, price = ?7, is_for_sale = ?8, contact_details = ?9
             WHERE id = ?1",
            params![
                artwork.id,
                artwork.title,
                artwork.description,
                artwork.image_path,
                artwork.artist_id,
                artwork.category,
                artwork.price,
                artwork.is_for_sale,
                artwork.contact_details,
            ],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn delete(&self, id: RecordId) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM artworks WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn get_by_id(&self, id: RecordId) -> AppResult<Option<Artwork>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM artworks WHERE id = ?1",
            ARTWORK_COLUMNS
        ))?;

        match stmt.query_row(params![id], Self::row_to_artwork) {
            Ok(artwork) => Ok(Some(artwork)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn list(&self, criteria: &ArtworkCriteria) -> AppResult<Vec<Artwork>> {
        let conn = self.pool.get()?;
        let filter = criteria.to_filter();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM artworks{} ORDER BY id DESC",
            ARTWORK_COLUMNS,
            filter.where_sql()
        ))?;
        let artworks = stmt
            .query_map(params_from_iter(filter.values()), Self::row_to_artwork)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artworks)
    }

    fn list_page(
        &self,
        criteria: &ArtworkCriteria,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<Artwork>> {
        let conn = self.pool.get()?;
        let filter = criteria.to_filter();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM artworks{} ORDER BY id DESC LIMIT ? OFFSET ?",
            ARTWORK_COLUMNS,
            filter.where_sql()
        ))?;
        let artworks = stmt
            .query_map(
                params_from_iter(filter.paged_values(limit, offset)),
                Self::row_to_artwork,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artworks)
    }

    fn count(&self, criteria: &ArtworkCriteria) -> AppResult<i64> {
        let conn = self.pool.get()?;
        let filter = criteria.to_filter();
        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM artworks{}", filter.where_sql()),
            params_from_iter(filter.values()),
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn list_categories(&self) -> AppResult<Vec<String>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT DISTINCT category FROM artworks ORDER BY category")?;
        let categories = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::create_test_pool;
    use crate::domain::Artist;
    use crate::repositories::{ArtistRepository, SqliteArtistRepository};

    fn seeded() -> (tempfile::TempDir, SqliteArtworkRepository, RecordId) {
        let (dir, pool) = create_test_pool();
        let artist_id = SqliteArtistRepository::new(Arc::clone(&pool))
            .insert(&Artist::new("S. H. Raza", ""))
            .unwrap();
        (dir, SqliteArtworkRepository::new(pool), artist_id)
    }

    #[test]
    fn test_pages_are_newest_first() {
        let (_dir, repo, artist) = seeded();
        let ids: Vec<RecordId> = (0..5)
            .map(|i| {
                repo.insert(&Artwork::new(format!("Bindu {}", i), "", artist, "painting"))
                    .unwrap()
            })
            .collect();

        let criteria = ArtworkCriteria::default();
        let first = repo.list_page(&criteria, 2, 0).unwrap();
        let second = repo.list_page(&criteria, 2, 2).unwrap();
        let third = repo.list_page(&criteria, 2, 4).unwrap();
        let fourth = repo.list_page(&criteria, 2, 6).unwrap();

        assert_eq!(first.iter().map(|a| a.id).collect::<Vec<_>>(), vec![ids[4], ids[3]]);
        assert_eq!(second.iter().map(|a| a.id).collect::<Vec<_>>(), vec![ids[2], ids[1]]);
        assert_eq!(third.len(), 1);
        assert!(fourth.is_empty());
    }

    #[test]
    fn test_criteria_filters() {
        let (_dir, repo, artist) = seeded();
        repo.insert(&Artwork::new("Sunset", "", artist, "painting")).unwrap();
        repo.insert(&Artwork::new("Ocean View", "", artist, "photography")).unwrap();
        repo.insert(
            &Artwork::new("Sunrise", "", artist, "painting").for_sale(5000.0, "raza@example.in"),
        )
        .unwrap();

        let sun = ArtworkCriteria {
            query: Some("SUN".to_string()),
            ..ArtworkCriteria::default()
        };
        assert_eq!(repo.count(&sun).unwrap(), 2);

        let photos = ArtworkCriteria {
            categories: vec!["photography".to_string()],
            ..ArtworkCriteria::default()
        };
        assert_eq!(repo.list(&photos).unwrap()[0].title, "Ocean View");

        let for_sale = repo.list(&ArtworkCriteria::for_sale()).unwrap();
        assert_eq!(for_sale.len(), 1);
        assert_eq!(for_sale[0].price, Some(5000.0));

        assert_eq!(repo.list_categories().unwrap(), vec!["painting", "photography"]);
    }

    #[test]
    fn test_insert_requires_existing_artist() {
        let (_dir, repo, _artist) = seeded();
        let result = repo.insert(&Artwork::new("Orphan", "", 9999, "painting"));
        assert!(matches!(result, Err(AppError::Database(_))));
    }
}

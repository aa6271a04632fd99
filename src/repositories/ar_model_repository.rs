// src/repositories/ar_model_repository.rs

use rusqlite::{params, params_from_iter, Row};
use std::sync::Arc;

use crate::db::values::{encode_timestamp, get_parsed, get_timestamp};
use crate::db::ConnectionPool;
use crate::domain::{ArCategory, ArModel, BoundingBox, InteractionType, RecordId};
use crate::error::{AppError, AppResult};
use crate::repositories::sql_filter::SqlFilter;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArModelCriteria {
    pub category: Option<ArCategory>,
    pub artist_id: Option<RecordId>,
    pub related_artwork_id: Option<RecordId>,
    pub interaction_type: Option<InteractionType>,
    pub downloaded_only: bool,
}

impl ArModelCriteria {
    pub fn for_artwork(artwork_id: RecordId) -> Self {
        Self {
            related_artwork_id: Some(artwork_id),
            ..Self::default()
        }
    }

    fn to_filter(&self) -> SqlFilter {
        let mut filter = SqlFilter::new();
        if let Some(category) = self.category {
            filter.eq("category", category.as_str().to_string());
        }
        if let Some(artist_id) = self.artist_id {
            filter.eq("artist_id", artist_id);
        }
        if let Some(artwork_id) = self.related_artwork_id {
            filter.eq("related_artwork_id", artwork_id);
        }
        if let Some(interaction) = self.interaction_type {
            filter.eq("interaction_type", interaction.as_str().to_string());
        }
        if self.downloaded_only {
            filter.raw("is_downloaded = 1");
        }
        filter
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait ArModelRepository: Send + Sync {
    fn insert(&self, model: &ArModel) -> AppResult<RecordId>;
    /// Insert under a caller-chosen id, as bundled assets carry their own
    fn insert_with_id(&self, id: RecordId, model: &ArModel) -> AppResult<RecordId>;
    fn update(&self, model: &ArModel) -> AppResult<()>;
    fn delete(&self, id: RecordId) -> AppResult<()>;
    fn get_by_id(&self, id: RecordId) -> AppResult<Option<ArModel>>;
    /// Newest first
    fn list(&self, criteria: &ArModelCriteria) -> AppResult<Vec<ArModel>>;
    fn list_page(
        &self,
        criteria: &ArModelCriteria,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<ArModel>>;
    fn set_download(
        &self,
        id: RecordId,
        model_file_path: &str,
        thumbnail_path: &str,
        file_size: u64,
        is_downloaded: bool,
    ) -> AppResult<()>;
    /// Bytes held by downloaded models
    fn total_downloaded_size(&self) -> AppResult<u64>;
}

pub struct SqliteArModelRepository {
    pool: Arc<ConnectionPool>,
}

const AR_MODEL_COLUMNS: &str = "id, name, description, model_file_path, thumbnail_path, \
     artist_id, related_artwork_id, category, scale, date_added, file_size, is_downloaded, \
     is_animated, animation_duration_ms, interaction_type, bounding_box_width, \
     bounding_box_height, bounding_box_depth";

fn size_to_sql(size: u64) -> i64 {
    i64::try_from(size).unwrap_or(i64::MAX)
}

impl SqliteArModelRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// `None` lets SQLite assign the id
    fn insert_row(&self, id: Option<RecordId>, model: &ArModel) -> AppResult<RecordId> {
        let conn = self.pool.get()?;
        let bounds = model.bounding_box;
        conn.execute(
            "INSERT INTO ar_models (name, description, model_file_path, thumbnail_path, artist_id,
                 related_artwork_id, category, scale, date_added, file_size, is_downloaded,
                 is_animated, animation_duration_ms, interaction_type, bounding_box_width,
                 bounding_box_height, bounding_box_depth, id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            params![
                model.name,
                model.description,
                model.model_file_path,
                model.thumbnail_path,
                model.artist_id,
                model.related_artwork_id,
                model.category.as_str(),
                model.scale,
                encode_timestamp(&model.date_added),
                size_to_sql(model.file_size),
                model.is_downloaded,
                model.is_animated,
                model.animation_duration_ms,
                model.interaction_type.as_str(),
                bounds.map(|b| b.width),
                bounds.map(|b| b.height),
                bounds.map(|b| b.depth),
                id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn row_to_model(row: &Row) -> Result<ArModel, rusqlite::Error> {
        let width: Option<f64> = row.get("bounding_box_width")?;
        let height: Option<f64> = row.get("bounding_box_height")?;
        let depth: Option<f64> = row.get("bounding_box_depth")?;
        let bounding_box = match (width, height, depth) {
            (Some(width), Some(height), Some(depth)) => Some(BoundingBox { width, height, depth }),
            _ => None,
        };
        let file_size: i64 = row.get("file_size")?;

        Ok(ArModel {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            model_file_path: row.get("model_file_path")?,
            thumbnail_path: row.get("thumbnail_path")?,
            artist_id: row.get("artist_id")?,
            related_artwork_id: row.get("related_artwork_id")?,
            category: get_parsed(row, "category")?,
            scale: row.get("scale")?,
            date_added: get_timestamp(row, "date_added")?,
            file_size: file_size.max(0) as u64,
            is_downloaded: row.get("is_downloaded")?,
            is_animated: row.get("is_animated")?,
            animation_duration_ms: row.get("animation_duration_ms")?,
            interaction_type: get_parsed(row, "interaction_type")?,
            bounding_box,
        })
    }
}

impl ArModelRepository for SqliteArModelRepository {
    fn insert(&self, model: &ArModel) -> AppResult<RecordId> {
        self.insert_row(None, model)
    }

    fn insert_with_id(&self, id: RecordId, model: &ArModel) -> AppResult<RecordId> {
        self.insert_row(Some(id), model)
    }

    fn update(&self, model: &ArModel) -> AppResult<()> {
        let conn = self.pool.get()?;
        let bounds = model.bounding_box;
        let rows = conn.execute(
            "UPDATE ar_models SET name = ?2, description = ?3, model_file_path = ?4,
                 thumbnail_path = ?5, artist_id = ?6, related_artwork_id = ?7, category = ?8,
                 scale = ?9, date_added = ?10, file_size = ?11, is_downloaded = ?12,
                 is_animated = ?13, animation_duration_ms = ?14, interaction_type = ?15,
                 bounding_box_width = ?16, bounding_box_height = ?17, bounding_box_depth = ?18
             WHERE id = ?1",
            params![
                model.id,
                model.name,
                model.description,
                model.model_file_path,
                model.thumbnail_path,
                model.artist_id,
                model.related_artwork_id,
                model.category.as_str(),
                model.scale,
                encode_timestamp(&model.date_added),
                size_to_sql(model.file_size),
                model.is_downloaded,
                model.is_animated,
                model.animation_duration_ms,
                model.interaction_type.as_str(),
                bounds.map(|b| b.width),
                bounds.map(|b| b.height),
                bounds.map(|b| b.depth),
            ],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn delete(&self, id: RecordId) -> AppResult<()> {
        let conn = self.pool.get()?;
        if conn.execute("DELETE FROM ar_models WHERE id = ?1", params![id])? == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn get_by_id(&self, id: RecordId) -> AppResult<Option<ArModel>> {
        let conn = self.pool.get()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM ar_models WHERE id = ?1", AR_MODEL_COLUMNS))?;
        match stmt.query_row(params![id], Self::row_to_model) {
            Ok(model) => Ok(Some(model)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn list(&self, criteria: &ArModelCriteria) -> AppResult<Vec<ArModel>> {
        let conn = self.pool.get()?;
        let filter = criteria.to_filter();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM ar_models{} ORDER BY date_added DESC, id DESC",
            AR_MODEL_COLUMNS,
            filter.where_sql()
        ))?;
        let models = stmt
            .query_map(params_from_iter(filter.values()), Self::row_to_model)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(models)
    }

    fn list_page(
        &self,
        criteria: &ArModelCriteria,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<ArModel>> {
        let conn = self.pool.get()?;
        let filter = criteria.to_filter();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM ar_models{} ORDER BY date_added DESC, id DESC LIMIT ? OFFSET ?",
            AR_MODEL_COLUMNS,
            filter.where_sql()
        ))?;
        let models = stmt
            .query_map(
                params_from_iter(filter.paged_values(limit, offset)),
                Self::row_to_model,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(models)
    }

    fn set_download(
        &self,
        id: RecordId,
        model_file_path: &str,
        thumbnail_path: &str,
        file_size: u64,
        is_downloaded: bool,
    ) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE ar_models SET model_file_path = ?2, thumbnail_path = ?3, file_size = ?4,
                 is_downloaded = ?5
             WHERE id = ?1",
            params![id, model_file_path, thumbnail_path, size_to_sql(file_size), is_downloaded],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn total_downloaded_size(&self) -> AppResult<u64> {
        let conn = self.pool.get()?;
        let total: i64 = conn.query_row(
            "SELECT COALESCE(SUM(file_size), 0) FROM ar_models WHERE is_downloaded = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(total.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::create_test_pool;
    use crate::domain::{Artist, Artwork};
    use crate::repositories::{
        ArtistRepository, ArtworkRepository, SqliteArtistRepository, SqliteArtworkRepository,
    };

    #[test]
    fn test_bounding_box_and_download_state() {
        let (_dir, pool) = create_test_pool();
        let artist = SqliteArtistRepository::new(Arc::clone(&pool))
            .insert(&Artist::new("Anish", ""))
            .unwrap();
        let repo = SqliteArModelRepository::new(pool);

        let mut model = ArModel::new("Cloud Gate", artist, ArCategory::Installation);
        model.bounding_box = Some(BoundingBox { width: 20.0, height: 10.0, depth: 13.0 });
        model.interaction_type = InteractionType::Rotatable;
        let id = repo.insert(&model).unwrap();
        repo.insert(&ArModel::new("Chair", artist, ArCategory::Furniture)).unwrap();

        let stored = repo.get_by_id(id).unwrap().unwrap();
        assert_eq!(stored.bounding_box, model.bounding_box);
        assert_eq!(stored.interaction_type, InteractionType::Rotatable);

        repo.set_download(id, "/m/ar_models/1_cloud.glb", "/m/ar_thumbnails/1.jpg", 2048, true)
            .unwrap();
        assert_eq!(repo.total_downloaded_size().unwrap(), 2048);

        let downloaded = repo
            .list(&ArModelCriteria {
                downloaded_only: true,
                ..ArModelCriteria::default()
            })
            .unwrap();
        assert_eq!(downloaded.len(), 1);
        assert_eq!(downloaded[0].file_size, 2048);
    }

    #[test]
    fn test_deleting_artwork_clears_relation() {
        let (_dir, pool) = create_test_pool();
        let artist = SqliteArtistRepository::new(Arc::clone(&pool))
            .insert(&Artist::new("Anish", ""))
            .unwrap();
        let artworks = SqliteArtworkRepository::new(Arc::clone(&pool));
        let artwork = artworks
            .insert(&Artwork::new("Sky Mirror", "", artist, "sculpture"))
            .unwrap();
        let repo = SqliteArModelRepository::new(pool);

        let mut model = ArModel::new("Sky Mirror AR", artist, ArCategory::Sculpture);
        model.related_artwork_id = Some(artwork);
        let id = repo.insert(&model).unwrap();
        assert_eq!(repo.list(&ArModelCriteria::for_artwork(artwork)).unwrap().len(), 1);

        artworks.delete(artwork).unwrap();
        assert_eq!(repo.get_by_id(id).unwrap().unwrap().related_artwork_id, None);
    }
}

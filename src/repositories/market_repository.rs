// src/repositories/market_repository.rs

use rusqlite::{params, Row};
use std::sync::Arc;

use crate::db::ConnectionPool;
use crate::domain::{MarketItem, RecordId};
use crate::error::{AppError, AppResult};

pub trait MarketRepository: Send + Sync {
    fn insert(&self, item: &MarketItem) -> AppResult<RecordId>;
    fn update(&self, item: &MarketItem) -> AppResult<()>;
    fn delete(&self, id: RecordId) -> AppResult<()>;
    fn get_by_id(&self, id: RecordId) -> AppResult<Option<MarketItem>>;
    fn list_available(&self) -> AppResult<Vec<MarketItem>>;
    fn list_by_artwork(&self, artwork_id: RecordId) -> AppResult<Vec<MarketItem>>;
    fn set_available(&self, id: RecordId, available: bool) -> AppResult<()>;
}

pub struct SqliteMarketRepository {
    pool: Arc<ConnectionPool>,
}

const MARKET_COLUMNS: &str = "id, artwork_id, price, is_available, description, contact_info";

impl SqliteMarketRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_item(row: &Row) -> Result<MarketItem, rusqlite::Error> {
        Ok(MarketItem {
            id: row.get("id")?,
            artwork_id: row.get("artwork_id")?,
            price: row.get("price")?,
            is_available: row.get("is_available")?,
            description: row.get("description")?,
            contact_info: row.get("contact_info")?,
        })
    }

    fn query(&self, where_sql: &str, param: Option<RecordId>) -> AppResult<Vec<MarketItem>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM market_items {} ORDER BY id DESC",
            MARKET_COLUMNS, where_sql
        ))?;
        let items = match param {
            Some(p) => stmt.query_map(params![p], Self::row_to_item)?,
            None => stmt.query_map([], Self::row_to_item)?,
        }
        .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }
}

impl MarketRepository for SqliteMarketRepository {
    fn insert(&self, item: &MarketItem) -> AppResult<RecordId> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO market_items (artwork_id, price, is_available, description, contact_info)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                item.artwork_id,
                item.price,
                item.is_available,
                item.description,
                item.contact_info
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, item: &MarketItem) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE market_items SET artwork_id = ?2, price = ?3, is_available = ?4,
                    description = ?5, contact_info = ?6
             WHERE id = ?1",
            params![
                item.id,
                item.artwork_id,
                item.price,
                item.is_available,
                item.description,
                item.contact_info
            ],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn delete(&self, id: RecordId) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM market_items WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn get_by_id(&self, id: RecordId) -> AppResult<Option<MarketItem>> {
        Ok(self.query("WHERE id = ?1", Some(id))?.into_iter().next())
    }

    fn list_available(&self) -> AppResult<Vec<MarketItem>> {
        self.query("WHERE is_available = 1", None)
    }

    fn list_by_artwork(&self, artwork_id: RecordId) -> AppResult<Vec<MarketItem>> {
        self.query("WHERE artwork_id = ?1", Some(artwork_id))
    }

    fn set_available(&self, id: RecordId, available: bool) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE market_items SET is_available = ?2 WHERE id = ?1",
            params![id, available],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

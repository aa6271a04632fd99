// src/db/connection.rs
//
// Database connection management
//
// PRINCIPLES:
// - One explicitly constructed handle per process, no global
// - Explicit connection pooling
// - Clear error propagation

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::CatalogConfig;
use crate::db::migrations::initialize_database;
use crate::error::{AppError, AppResult};

/// Type alias for connection pool
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled connection
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Create a connection pool for a database file
///
/// Every connection gets:
/// - Foreign keys enabled (cascades depend on it)
/// - WAL journal
/// - The configured busy timeout
pub fn create_connection_pool(
    db_path: &Path,
    max_size: u32,
    busy_timeout_ms: u32,
) -> AppResult<ConnectionPool> {
    let manager = SqliteConnectionManager::file(db_path).with_init(move |conn| {
        conn.execute_batch(&format!(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = {};",
            busy_timeout_ms
        ))
    });

    Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(|e| AppError::Pool(format!("Failed to create connection pool: {}", e)))
}

/// Get a connection from the pool
pub fn get_connection(pool: &ConnectionPool) -> AppResult<PooledConn> {
    pool.get()
        .map_err(|e| AppError::Pool(format!("Failed to get database connection: {}", e)))
}

/// Handle to the catalogue database.
///
/// Constructed once by the composition root and handed to repositories as a
/// shared pool. `close` checkpoints the WAL so the file is self-contained.
pub struct Database {
    pool: Arc<ConnectionPool>,
    path: PathBuf,
}

impl Database {
    /// Open (creating if needed) the database described by the config and
    /// bring its schema to the current version.
    pub fn open(config: &CatalogConfig) -> AppResult<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let path = config.database_path();

        let pool = create_connection_pool(&path, config.pool_max_size, config.busy_timeout_ms)?;
        {
            let conn = get_connection(&pool)?;
            initialize_database(&conn)?;
        }

        log::info!("Opened catalogue database at {}", path.display());
        Ok(Self {
            pool: Arc::new(pool),
            path,
        })
    }

    pub fn pool(&self) -> Arc<ConnectionPool> {
        Arc::clone(&self.pool)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connection(&self) -> AppResult<PooledConn> {
        get_connection(&self.pool)
    }

    /// Flush the WAL and release the pool.
    ///
    /// Repositories still holding a pool clone keep working until dropped;
    /// the checkpoint only guarantees what was committed so far is on disk.
    pub fn close(self) -> AppResult<()> {
        {
            let conn = get_connection(&self.pool)?;
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        }
        log::info!("Closed catalogue database at {}", self.path.display());
        Ok(())
    }
}

/// Create a standalone in-memory connection (for testing)
pub fn create_test_connection() -> AppResult<Connection> {
    let conn = Connection::open_in_memory().map_err(AppError::Database)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(AppError::Database)?;
    Ok(conn)
}

/// File-backed pool with the full schema applied.
///
/// The TempDir must outlive the pool.
#[cfg(test)]
pub fn create_test_pool() -> (tempfile::TempDir, Arc<ConnectionPool>) {
    let dir = tempfile::TempDir::new().unwrap();
    let pool = create_connection_pool(&dir.path().join("test.db"), 4, 5000).unwrap();
    {
        let conn = pool.get().unwrap();
        initialize_database(&conn).unwrap();
    }
    (dir, Arc::new(pool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_file_and_schema() {
        let dir = TempDir::new().unwrap();
        let config = CatalogConfig::in_directory(dir.path().join("nested"));

        let db = Database::open(&config).unwrap();
        assert!(db.path().exists());

        let conn = db.connection().unwrap();
        let fk_enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk_enabled, 1);
        drop(conn);

        db.close().unwrap();
    }

    #[test]
    fn test_reopen_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let config = CatalogConfig::in_directory(dir.path());

        Database::open(&config).unwrap().close().unwrap();
        let db = Database::open(&config).unwrap();
        let conn = db.connection().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_test_connection() {
        let conn = create_test_connection().unwrap();

        let result: i32 = conn
            .query_row("SELECT 1 + 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(result, 2);

        let fk_enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk_enabled, 1);
    }
}

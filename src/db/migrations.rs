// src/db/migrations.rs
//
// Database schema initialization and migrations
//
// PRINCIPLES:
// - Explicit, ordered schema versions
// - Each step runs in its own transaction
// - Idempotent: safe to call on every start

use rusqlite::Connection;

use crate::db::values::encode_timestamp;
use crate::error::{AppError, AppResult};

/// Current schema version
/// Increment this when adding migrations
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Ordered migration steps: (target version, description, SQL)
const MIGRATIONS: &[(i32, &str, &str)] = &[
    (1, "core catalogue", include_str!("../../migrations/001_catalogue.sql")),
    (
        2,
        "community and media",
        include_str!("../../migrations/002_community_media.sql"),
    ),
];

/// Initialize the database schema
///
/// Applies every migration newer than the stored version, in order.
/// A database written by a newer build is refused.
pub fn initialize_database(conn: &Connection) -> AppResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(AppError::Other(format!(
            "Schema version {} is newer than supported {}. Update the application.",
            current_version, CURRENT_SCHEMA_VERSION
        )));
    }

    for (version, description, sql) in MIGRATIONS {
        if *version <= current_version {
            continue;
        }
        apply_migration(conn, *version, description, sql)?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: i32, description: &str, sql: &str) -> AppResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(sql).map_err(|e| {
        AppError::Other(format!(
            "Failed to apply migration {} ({}): {}",
            version, description, e
        ))
    })?;
    set_schema_version(&tx, version)?;
    tx.commit()?;

    log::info!("Applied schema migration {} ({})", version, description);
    Ok(())
}

/// Get current schema version
/// Returns 0 if schema_version table doesn't exist (fresh database)
pub fn get_schema_version(conn: &Connection) -> AppResult<i32> {
    let table_exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;

    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> AppResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![version, encode_timestamp(&chrono::Utc::now())],
    )?;
    Ok(())
}

/// Verify database integrity
///
/// Runs SQLite's integrity check plus a foreign key check.
pub fn verify_database_integrity(conn: &Connection) -> AppResult<()> {
    let result: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;

    if result != "ok" {
        return Err(AppError::Other(format!(
            "Database integrity check failed: {}",
            result
        )));
    }

    let mut stmt = conn.prepare("PRAGMA foreign_key_check")?;
    let violations: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    if !violations.is_empty() {
        return Err(AppError::Other(format!(
            "Foreign key violations in tables: {}",
            violations.join(", ")
        )));
    }

    Ok(())
}

/// Get database statistics
///
/// Returns useful info for debugging and monitoring
pub fn get_database_stats(conn: &Connection) -> AppResult<DatabaseStats> {
    let page_count: i64 = conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
    let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;

    let count = |table: &str| -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap_or(0)
    };

    Ok(DatabaseStats {
        size_bytes: page_count * page_size,
        page_count,
        page_size,
        schema_version: get_schema_version(conn)?,
        artist_count: count("artists"),
        artwork_count: count("artworks"),
        event_count: count("events"),
        forum_post_count: count("forum_posts"),
        tutorial_count: count("tutorials"),
        performance_count: count("performances"),
        ar_model_count: count("ar_models"),
    })
}

/// Database statistics
#[derive(Debug)]
pub struct DatabaseStats {
    pub size_bytes: i64,
    pub page_count: i64,
    pub page_size: i64,
    pub schema_version: i32,
    pub artist_count: i64,
    pub artwork_count: i64,
    pub event_count: i64,
    pub forum_post_count: i64,
    pub tutorial_count: i64,
    pub performance_count: i64,
    pub ar_model_count: i64,
}

// src/db/mod.rs
//
// Database module
//
// Provides:
// - The Database handle and connection pooling
// - Schema migrations
// - Column encoding helpers

pub mod connection;
pub mod migrations;
pub mod values;

pub use connection::{
    create_connection_pool, create_test_connection, get_connection, ConnectionPool, Database,
    PooledConn,
};

pub use migrations::{
    get_database_stats, get_schema_version, initialize_database, verify_database_integrity,
    DatabaseStats, CURRENT_SCHEMA_VERSION,
};

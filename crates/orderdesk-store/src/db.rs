//! Database connection management
//!
//! Provides utilities for opening and managing SQLite connections

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Configure a connection with optimal settings
pub fn configure(conn: &Connection) -> Result<()> {
    // Enable foreign keys
    conn.execute("PRAGMA foreign_keys = ON", [])
        .map_err(from_rusqlite)?;

    // Set WAL mode for better concurrency; the pragma reports the new mode
    // as a row, so it must go through the query path
    conn.query_row("PRAGMA journal_mode = WAL", [], |_row| Ok(()))
        .map_err(from_rusqlite)?;

    // Wait out writer contention instead of failing immediately
    conn.busy_timeout(Duration::from_millis(5000))
        .map_err(from_rusqlite)?;

    Ok(())
}

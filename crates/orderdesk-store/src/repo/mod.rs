//! Repository layer for persisting domain models to SQLite
//!
//! Bridges the in-memory Store to SQLite persistence

pub mod hydration;
pub mod sqlite_repo;

pub use sqlite_repo::{SqliteReferenceIndex, SqliteRepo};

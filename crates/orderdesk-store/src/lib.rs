//! OrderDesk Store - SQLite persistence for orders
//!
//! Provides:
//! - SQLite schema with migrations framework
//! - Repository layer bridging the in-memory Store to persistence
//! - Hydration back into domain models with deterministic ordering
//! - Storage-backed reference probes for the allocator

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

// Re-export key types
pub use errors::Result;

//! OrderDesk Core - sales-order domain model and operations
//!
//! This crate provides the foundational data structures and operations for
//! OrderDesk, including:
//! - Order, OrderItem and ReferenceEntry models with full CRUD semantics
//! - Reference allocation: one human-readable reference per organization per
//!   calendar year, collision-safe under concurrent creation
//! - Total recalculation: exact minor-unit money arithmetic over line items
//! - Field validation rules and query filters
//!
//! Persistence lives in `orderdesk-store`; the command surface that ties
//! allocation, recalculation and persistence together lives in
//! `orderdesk-engine`.

pub mod directory;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod money;
pub mod ops;
pub mod queries;
pub mod rules;

// Re-export commonly used types
pub use directory::{Organization, OrganizationDirectory, StaticDirectory};
pub use errors::{DeskError, DeskErrorKind, OrderDeskError, Result};
pub use model::{Order, OrderItem, ReferenceEntry};
pub use money::{Currency, Money};
pub use ops::Store;

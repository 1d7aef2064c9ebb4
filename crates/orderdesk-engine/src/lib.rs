//! OrderDesk Engine - Orchestration layer
//!
//! Provides high-level command orchestration that coordinates between
//! core domain logic and persistence layer. This is where the creation
//! pipeline lives: validate, allocate a reference inside a transaction,
//! recalculate totals, persist, and retry the whole cycle when a
//! concurrent writer wins the reference slot.

pub mod commands;

//! Engine-level order commands for I/O operations.

#![allow(clippy::result_large_err)]

use crate::commands::order::{ItemDraft, OrderDraft};
use orderdesk_core::ops::OrderPatch;
use orderdesk_core::OrganizationDirectory;
use orderdesk_store::errors::Result;
use rusqlite::Connection;

/// Engine-level commands that require I/O (database, directory).
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Create an order with its items; allocates a reference.
    CreateOrder { draft: OrderDraft },
    /// Patch an order's writable fields.
    UpdateOrder { order_id: String, patch: OrderPatch },
    /// Hard-delete an order; items cascade.
    DeleteOrder { order_id: String },
    /// Attach a line item to an order.
    AddOrderItem { order_id: String, draft: ItemDraft },
    /// Detach a line item from an order (orphan removal).
    RemoveOrderItem { order_id: String, item_id: String },
}

/// Result of applying an engine command.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommandResult {
    /// Order was created; carries the new order's ID.
    OrderCreated { order_id: String },
    /// Order was updated.
    OrderUpdated,
    /// Order was deleted.
    OrderDeleted,
    /// Item was attached; carries the new item's ID.
    ItemAdded { item_id: String },
    /// Item was detached.
    ItemRemoved,
}

/// Apply an engine command with the deployment's organization directory.
pub fn apply_engine_command(
    cmd: EngineCommand,
    conn: &mut Connection,
    directory: &dyn OrganizationDirectory,
) -> Result<EngineCommandResult> {
    match cmd {
        EngineCommand::CreateOrder { draft } => {
            let order_id = crate::commands::order::order_create(draft, conn, directory)?;
            Ok(EngineCommandResult::OrderCreated { order_id })
        }
        EngineCommand::UpdateOrder { order_id, patch } => {
            crate::commands::order::order_update(order_id, patch, conn)?;
            Ok(EngineCommandResult::OrderUpdated)
        }
        EngineCommand::DeleteOrder { order_id } => {
            crate::commands::order::order_delete(order_id, conn)?;
            Ok(EngineCommandResult::OrderDeleted)
        }
        EngineCommand::AddOrderItem { order_id, draft } => {
            let item_id = crate::commands::order::order_item_add(order_id, draft, conn)?;
            Ok(EngineCommandResult::ItemAdded { item_id })
        }
        EngineCommand::RemoveOrderItem { order_id, item_id } => {
            crate::commands::order::order_item_remove(order_id, item_id, conn)?;
            Ok(EngineCommandResult::ItemRemoved)
        }
    }
}

//! SQLite repository implementation
//!
//! Persists Orders, OrderItems and reference ledger entries to SQLite

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use chrono::{DateTime, Utc};
use orderdesk_core::errors::{OrderDeskError, Result as CoreResult};
use orderdesk_core::model::{Order, OrderItem, ReferenceEntry};
use orderdesk_core::ops::ReferenceIndex;
use rusqlite::{Connection, OptionalExtension, Transaction};

/// SQLite repository for Orders and OrderItems
pub struct SqliteRepo;

impl SqliteRepo {
    /// Persist an Order to the database
    ///
    /// Saves the order row only; items are persisted separately. The
    /// organization and creation timestamp never change after insert.
    pub fn persist_order(conn: &Connection, order: &Order) -> Result<()> {
        conn.execute(
            ORDER_UPSERT_SQL,
            rusqlite::params![
                order.id,
                order.organization,
                order.reference,
                order.reference_id,
                order.name,
                order.description,
                order.customer,
                order.invoice,
                order.resource,
                serde_json::to_string(&order.resources).unwrap_or_else(|_| "[]".to_string()),
                order.remark,
                order.price,
                order.price_currency,
                order.created_at.timestamp(),
                order.updated_at.timestamp(),
            ],
        )
        .map_err(from_rusqlite)?;

        Ok(())
    }

    /// Persist an Order within a transaction
    pub fn persist_order_tx(tx: &Transaction, order: &Order) -> Result<()> {
        tx.execute(
            ORDER_UPSERT_SQL,
            rusqlite::params![
                order.id,
                order.organization,
                order.reference,
                order.reference_id,
                order.name,
                order.description,
                order.customer,
                order.invoice,
                order.resource,
                serde_json::to_string(&order.resources).unwrap_or_else(|_| "[]".to_string()),
                order.remark,
                order.price,
                order.price_currency,
                order.created_at.timestamp(),
                order.updated_at.timestamp(),
            ],
        )
        .map_err(from_rusqlite)?;

        Ok(())
    }

    /// Persist an OrderItem to the database
    pub fn persist_item(conn: &Connection, item: &OrderItem) -> Result<()> {
        conn.execute(
            ITEM_UPSERT_SQL,
            rusqlite::params![
                item.id,
                item.order_id,
                item.offer,
                item.product,
                item.quantity,
                item.price,
                item.price_currency,
                item.tax_percentage,
                item.created_at.timestamp(),
            ],
        )
        .map_err(from_rusqlite)?;

        Ok(())
    }

    /// Persist an OrderItem within a transaction
    pub fn persist_item_tx(tx: &Transaction, item: &OrderItem) -> Result<()> {
        tx.execute(
            ITEM_UPSERT_SQL,
            rusqlite::params![
                item.id,
                item.order_id,
                item.offer,
                item.product,
                item.quantity,
                item.price,
                item.price_currency,
                item.tax_percentage,
                item.created_at.timestamp(),
            ],
        )
        .map_err(from_rusqlite)?;

        Ok(())
    }

    /// Get an Order from the database by ID
    ///
    /// Returns the order row only; the hydration layer attaches items.
    pub fn get_order(conn: &Connection, order_id: &str) -> Result<Option<Order>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, organization, reference, reference_id, name, description, customer,
                        invoice, resource, resources, remark, price, price_currency,
                        created_at, updated_at
                 FROM orders WHERE id = ?",
            )
            .map_err(from_rusqlite)?;

        let result = stmt
            .query_row([order_id], order_from_row)
            .optional()
            .map_err(from_rusqlite)?;

        Ok(result)
    }

    /// Find the ID of the order carrying a reference, if any
    pub fn find_by_reference(conn: &Connection, reference: &str) -> Result<Option<String>> {
        let result = conn
            .query_row(
                "SELECT id FROM orders WHERE reference = ?",
                [reference],
                |row| row.get(0),
            )
            .optional()
            .map_err(from_rusqlite)?;

        Ok(result)
    }

    /// Whether any persisted order carries exactly this reference
    pub fn exists_with_reference(conn: &Connection, reference: &str) -> Result<bool> {
        let found: Option<i32> = conn
            .query_row(
                "SELECT 1 FROM orders WHERE reference = ? LIMIT 1",
                [reference],
                |row| row.get(0),
            )
            .optional()
            .map_err(from_rusqlite)?;

        Ok(found.is_some())
    }

    /// Highest reference id used by an organization within a time window
    ///
    /// The window is inclusive on both ends; callers pass calendar-year
    /// bounds in UTC.
    pub fn max_reference_id(
        conn: &Connection,
        organization: &str,
        year_start: DateTime<Utc>,
        year_end: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        let max: Option<i64> = conn
            .query_row(
                "SELECT MAX(reference_id) FROM orders
                 WHERE organization = ?1 AND created_at >= ?2 AND created_at <= ?3",
                rusqlite::params![organization, year_start.timestamp(), year_end.timestamp()],
                |row| row.get(0),
            )
            .map_err(from_rusqlite)?;

        Ok(max)
    }

    /// List all order IDs in deterministic order
    pub fn list_order_ids(conn: &Connection) -> Result<Vec<String>> {
        let mut stmt = conn
            .prepare("SELECT id FROM orders ORDER BY id")
            .map_err(from_rusqlite)?;

        let ids: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        Ok(ids)
    }

    /// Append a reference ledger entry within a transaction
    ///
    /// Returns the assigned ledger row id.
    pub fn persist_reference_entry_tx(tx: &Transaction, entry: &ReferenceEntry) -> Result<i64> {
        tx.execute(
            "INSERT INTO reference_entries (order_id, created_at) VALUES (?1, ?2)",
            rusqlite::params![entry.order_id, entry.created_at.timestamp()],
        )
        .map_err(from_rusqlite)?;

        Ok(tx.last_insert_rowid())
    }

    /// List ledger entries for an order, oldest first
    pub fn list_reference_entries(conn: &Connection, order_id: &str) -> Result<Vec<ReferenceEntry>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, order_id, created_at FROM reference_entries
                 WHERE order_id = ? ORDER BY id",
            )
            .map_err(from_rusqlite)?;

        let entries: Vec<ReferenceEntry> = stmt
            .query_map([order_id], |row| {
                let id: i64 = row.get(0)?;
                let order_id: String = row.get(1)?;
                let created_at: i64 = row.get(2)?;

                let mut entry = ReferenceEntry::new(order_id);
                entry.id = id;
                entry.created_at = chrono::DateTime::from_timestamp(created_at, 0)
                    .unwrap_or_else(chrono::Utc::now);

                Ok(entry)
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        Ok(entries)
    }

    /// Delete an Order within a transaction
    ///
    /// Items go with it via ON DELETE CASCADE. Returns whether a row was
    /// actually removed.
    pub fn delete_order_tx(tx: &Transaction, order_id: &str) -> Result<bool> {
        let affected = tx
            .execute("DELETE FROM orders WHERE id = ?", [order_id])
            .map_err(from_rusqlite)?;

        Ok(affected > 0)
    }

    /// Delete an OrderItem within a transaction
    pub fn delete_item_tx(tx: &Transaction, item_id: &str) -> Result<bool> {
        let affected = tx
            .execute("DELETE FROM order_items WHERE id = ?", [item_id])
            .map_err(from_rusqlite)?;

        Ok(affected > 0)
    }
}

const ORDER_UPSERT_SQL: &str = "INSERT INTO orders (id, organization, reference, reference_id, name, description, customer, invoice, resource, resources, remark, price, price_currency, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
     ON CONFLICT(id) DO UPDATE SET
        reference = excluded.reference,
        reference_id = excluded.reference_id,
        name = excluded.name,
        description = excluded.description,
        customer = excluded.customer,
        invoice = excluded.invoice,
        resource = excluded.resource,
        resources = excluded.resources,
        remark = excluded.remark,
        price = excluded.price,
        price_currency = excluded.price_currency,
        updated_at = excluded.updated_at";

const ITEM_UPSERT_SQL: &str = "INSERT INTO order_items (id, order_id, offer, product, quantity, price, price_currency, tax_percentage, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
     ON CONFLICT(id) DO UPDATE SET
        offer = excluded.offer,
        product = excluded.product,
        quantity = excluded.quantity,
        price = excluded.price,
        price_currency = excluded.price_currency,
        tax_percentage = excluded.tax_percentage";

/// Map a full order row to the domain model
pub(crate) fn order_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Order> {
    let id: String = row.get(0)?;
    let organization: String = row.get(1)?;
    let reference: Option<String> = row.get(2)?;
    let reference_id: Option<i64> = row.get(3)?;
    let name: Option<String> = row.get(4)?;
    let description: Option<String> = row.get(5)?;
    let customer: Option<String> = row.get(6)?;
    let invoice: Option<String> = row.get(7)?;
    let resource: Option<String> = row.get(8)?;
    let resources_json: String = row.get(9)?;
    let remark: Option<String> = row.get(10)?;
    let price: Option<String> = row.get(11)?;
    let price_currency: Option<String> = row.get(12)?;
    let created_at: i64 = row.get(13)?;
    let updated_at: i64 = row.get(14)?;

    let mut order = Order::new(id, organization);
    order.reference = reference;
    order.reference_id = reference_id;
    order.name = name;
    order.description = description;
    order.customer = customer;
    order.invoice = invoice;
    order.resource = resource;
    order.resources = serde_json::from_str(&resources_json).unwrap_or_default();
    order.remark = remark;
    order.price = price;
    order.price_currency = price_currency;
    order.created_at =
        chrono::DateTime::from_timestamp(created_at, 0).unwrap_or_else(chrono::Utc::now);
    order.updated_at =
        chrono::DateTime::from_timestamp(updated_at, 0).unwrap_or_else(chrono::Utc::now);

    Ok(order)
}

/// Storage-backed probes for the reference allocator
///
/// Borrows a connection (or a transaction, through deref) and answers the
/// allocator's queries from the orders table. Probe failures surface as
/// `Internal`; the allocator counts them against its attempt budget.
pub struct SqliteReferenceIndex<'a>(pub &'a Connection);

impl ReferenceIndex for SqliteReferenceIndex<'_> {
    fn max_reference_id(
        &self,
        organization: &str,
        year_start: DateTime<Utc>,
        year_end: DateTime<Utc>,
    ) -> CoreResult<Option<i64>> {
        SqliteRepo::max_reference_id(self.0, organization, year_start, year_end)
            .map_err(domain_error)
    }

    fn exists_with_reference(&self, reference: &str) -> CoreResult<bool> {
        SqliteRepo::exists_with_reference(self.0, reference).map_err(domain_error)
    }
}

fn domain_error(err: orderdesk_core::errors::DeskError) -> OrderDeskError {
    OrderDeskError::Internal {
        message: err.to_string(),
    }
}

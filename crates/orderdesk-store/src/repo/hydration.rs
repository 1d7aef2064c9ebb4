//! Hydration layer - loads domain models from SQLite into Store
//!
//! Converts database rows back into Order/OrderItem structs with
//! deterministic ordering

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use crate::repo::sqlite_repo::order_from_row;
use orderdesk_core::model::OrderItem;
use orderdesk_core::ops::Store;
use rusqlite::{Connection, OptionalExtension};

const ORDER_COLUMNS: &str = "id, organization, reference, reference_id, name, description, customer, invoice, resource, resources, remark, price, price_currency, created_at, updated_at";

/// Load a single Order with its items from the database into the Store
///
/// Returns false when no such order exists; the Store is left untouched.
pub fn load_order(conn: &Connection, order_id: &str, store: &mut Store) -> Result<bool> {
    let mut stmt = conn
        .prepare(&format!("SELECT {} FROM orders WHERE id = ?", ORDER_COLUMNS))
        .map_err(from_rusqlite)?;

    let order = stmt
        .query_row([order_id], order_from_row)
        .optional()
        .map_err(from_rusqlite)?;

    let Some(mut order) = order else {
        return Ok(false);
    };

    for item in read_items(conn, &order.id)? {
        order.attach_item(item);
    }

    store.insert_order(order);

    Ok(true)
}

/// Load all Orders with their items from the database into a fresh Store
///
/// Orders arrive sorted by ID, items within each order by creation time.
pub fn load_store(conn: &Connection) -> Result<Store> {
    let mut store = Store::new();

    let mut stmt = conn
        .prepare(&format!("SELECT {} FROM orders ORDER BY id", ORDER_COLUMNS))
        .map_err(from_rusqlite)?;

    let orders = stmt
        .query_map([], order_from_row)
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    for mut order in orders {
        for item in read_items(conn, &order.id)? {
            order.attach_item(item);
        }
        store.insert_order(order);
    }

    Ok(store)
}

/// Read the items belonging to one order, oldest first
fn read_items(conn: &Connection, order_id: &str) -> Result<Vec<OrderItem>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, order_id, offer, product, quantity, price, price_currency,
                    tax_percentage, created_at
             FROM order_items WHERE order_id = ? ORDER BY created_at, id",
        )
        .map_err(from_rusqlite)?;

    let items: Vec<OrderItem> = stmt
        .query_map([order_id], |row| {
            let id: String = row.get(0)?;
            let order_id: String = row.get(1)?;
            let offer: String = row.get(2)?;
            let product: Option<String> = row.get(3)?;
            let quantity: u32 = row.get(4)?;
            let price: String = row.get(5)?;
            let price_currency: String = row.get(6)?;
            let tax_percentage: Option<i32> = row.get(7)?;
            let created_at: i64 = row.get(8)?;

            let mut item = OrderItem::new(id, order_id, offer, quantity, price, price_currency);
            item.product = product;
            item.tax_percentage = tax_percentage;
            item.created_at = chrono::DateTime::from_timestamp(created_at, 0)
                .unwrap_or_else(chrono::Utc::now);

            Ok(item)
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations;
    use crate::repo::SqliteRepo;
    use orderdesk_core::model::Order;

    fn setup_test_db() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        migrations::apply_migrations(&mut conn).unwrap();
        conn
    }

    #[test]
    fn test_load_order() {
        let conn = setup_test_db();
        let order = Order::new("ord-1".to_string(), "org:acme".to_string());
        SqliteRepo::persist_order(&conn, &order).unwrap();

        let mut store = Store::new();
        assert!(load_order(&conn, "ord-1", &mut store).unwrap());

        let loaded = store.get_order("ord-1").unwrap();
        assert_eq!(loaded.id, "ord-1");
        assert_eq!(loaded.organization, "org:acme");
    }

    #[test]
    fn test_load_order_missing() {
        let conn = setup_test_db();
        let mut store = Store::new();
        assert!(!load_order(&conn, "nope", &mut store).unwrap());
        assert!(store.list_orders().is_empty());
    }

    #[test]
    fn test_load_store_empty() {
        let conn = setup_test_db();
        let store = load_store(&conn).unwrap();
        assert_eq!(store.list_orders().len(), 0);
    }

    #[test]
    fn test_load_store_attaches_items() {
        let conn = setup_test_db();
        let order = Order::new("ord-1".to_string(), "org:acme".to_string());
        SqliteRepo::persist_order(&conn, &order).unwrap();

        let item = OrderItem::new(
            "item-1".to_string(),
            "ord-1".to_string(),
            "offer:widget".to_string(),
            2,
            "10.00".to_string(),
            "EUR".to_string(),
        );
        SqliteRepo::persist_item(&conn, &item).unwrap();

        let store = load_store(&conn).unwrap();
        let loaded = store.get_order("ord-1").unwrap();
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.items[0].id, "item-1");
        assert_eq!(loaded.items[0].quantity, 2);
    }
}

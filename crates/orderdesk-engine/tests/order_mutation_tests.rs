//! Mutation and query tests: updates, item changes, deletes, reads

use chrono::{Datelike, Utc};
use orderdesk_core::errors::DeskErrorKind;
use orderdesk_core::ops::OrderPatch;
use orderdesk_core::queries::{OrderFilters, PaginationParams};
use orderdesk_core::{Organization, StaticDirectory};
use orderdesk_engine::commands::engine_command::{
    apply_engine_command, EngineCommand, EngineCommandResult,
};
use orderdesk_engine::commands::order::{ItemDraft, OrderDraft};
use orderdesk_engine::commands::order_query;
use rusqlite::Connection;
use tempfile::TempDir;

fn setup_db() -> (TempDir, Connection) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let mut conn = Connection::open(&db_path).unwrap();
    orderdesk_store::db::configure(&conn).unwrap();
    orderdesk_store::migrations::apply_migrations(&mut conn).unwrap();
    (temp_dir, conn)
}

fn directory() -> StaticDirectory {
    let mut directory = StaticDirectory::new();
    directory.insert(Organization::new("org:acme", "Acme Corporation").with_shortcode("ACME"));
    directory.insert(Organization::new("org:other", "Other GmbH").with_shortcode("OTH"));
    directory
}

fn item(price: &str, quantity: u32, currency: &str) -> ItemDraft {
    ItemDraft {
        offer: "offer:widget".to_string(),
        quantity,
        price: price.to_string(),
        price_currency: currency.to_string(),
        tax_percentage: None,
    }
}

fn create(conn: &mut Connection, organization: &str, items: Vec<ItemDraft>) -> String {
    let result = apply_engine_command(
        EngineCommand::CreateOrder {
            draft: OrderDraft {
                organization: organization.to_string(),
                items,
                ..OrderDraft::default()
            },
        },
        conn,
        &directory(),
    )
    .unwrap();
    let EngineCommandResult::OrderCreated { order_id } = result else {
        panic!("Expected OrderCreated")
    };
    order_id
}

fn stored_price(conn: &Connection, order_id: &str) -> String {
    conn.query_row(
        "SELECT price FROM orders WHERE id = ?",
        [order_id],
        |r| r.get(0),
    )
    .unwrap()
}

#[test]
fn test_update_persists_patch_and_keeps_reference() {
    let (_tmp, mut conn) = setup_db();
    let order_id = create(&mut conn, "org:acme", vec![item("10.00", 1, "EUR")]);
    let before = order_query::order_get(&order_id, &conn).unwrap();

    let result = apply_engine_command(
        EngineCommand::UpdateOrder {
            order_id: order_id.clone(),
            patch: OrderPatch {
                name: Some("Spring order".to_string()),
                remark: Some("rush".to_string()),
                ..OrderPatch::default()
            },
        },
        &mut conn,
        &directory(),
    )
    .unwrap();
    assert_eq!(result, EngineCommandResult::OrderUpdated);

    let after = order_query::order_get(&order_id, &conn).unwrap();
    assert_eq!(after.name.as_deref(), Some("Spring order"));
    assert_eq!(after.remark.as_deref(), Some("rush"));
    assert_eq!(after.reference, before.reference);
    assert_eq!(after.price.as_deref(), Some("10.00"));
}

#[test]
fn test_update_missing_order() {
    let (_tmp, mut conn) = setup_db();

    let result = apply_engine_command(
        EngineCommand::UpdateOrder {
            order_id: "nope".to_string(),
            patch: OrderPatch::default(),
        },
        &mut conn,
        &directory(),
    );

    let Err(err) = result else {
        panic!("Expected NotFound")
    };
    assert_eq!(err.kind(), DeskErrorKind::NotFound);
}

#[test]
fn test_add_item_recomputes_stored_total() {
    let (_tmp, mut conn) = setup_db();
    let order_id = create(&mut conn, "org:acme", vec![item("10.00", 1, "EUR")]);
    assert_eq!(stored_price(&conn, &order_id), "10.00");

    let result = apply_engine_command(
        EngineCommand::AddOrderItem {
            order_id: order_id.clone(),
            draft: item("5.50", 1, "EUR"),
        },
        &mut conn,
        &directory(),
    )
    .unwrap();
    let EngineCommandResult::ItemAdded { item_id } = result else {
        panic!("Expected ItemAdded")
    };

    assert_eq!(stored_price(&conn, &order_id), "15.50");
    let order = order_query::order_get(&order_id, &conn).unwrap();
    assert_eq!(order.items.len(), 2);
    assert!(order.items.iter().any(|i| i.id == item_id));
}

#[test]
fn test_add_mixed_currency_item_rejected_and_rolled_back() {
    let (_tmp, mut conn) = setup_db();
    let order_id = create(&mut conn, "org:acme", vec![item("10.00", 1, "EUR")]);

    let result = apply_engine_command(
        EngineCommand::AddOrderItem {
            order_id: order_id.clone(),
            draft: item("3.00", 1, "USD"),
        },
        &mut conn,
        &directory(),
    );

    let Err(err) = result else {
        panic!("Expected MixedCurrency")
    };
    assert_eq!(err.kind(), DeskErrorKind::MixedCurrency);
    // The stored order is untouched
    assert_eq!(stored_price(&conn, &order_id), "10.00");
    let items: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM order_items WHERE order_id = ?",
            [&order_id],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(items, 1);
}

#[test]
fn test_remove_item_recomputes_and_deletes_row() {
    let (_tmp, mut conn) = setup_db();
    let order_id = create(
        &mut conn,
        "org:acme",
        vec![item("10.00", 2, "EUR"), item("5.50", 1, "EUR")],
    );
    assert_eq!(stored_price(&conn, &order_id), "25.50");

    let order = order_query::order_get(&order_id, &conn).unwrap();
    let removed_id = order.items[1].id.clone();

    apply_engine_command(
        EngineCommand::RemoveOrderItem {
            order_id: order_id.clone(),
            item_id: removed_id.clone(),
        },
        &mut conn,
        &directory(),
    )
    .unwrap();

    assert_eq!(stored_price(&conn, &order_id), "20.00");
    let gone: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM order_items WHERE id = ?",
            [&removed_id],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(gone, 0);
}

#[test]
fn test_remove_missing_item() {
    let (_tmp, mut conn) = setup_db();
    let order_id = create(&mut conn, "org:acme", vec![]);

    let result = apply_engine_command(
        EngineCommand::RemoveOrderItem {
            order_id,
            item_id: "item-nope".to_string(),
        },
        &mut conn,
        &directory(),
    );

    let Err(err) = result else {
        panic!("Expected NotFound")
    };
    assert_eq!(err.kind(), DeskErrorKind::NotFound);
}

#[test]
fn test_delete_order_cascades_items_keeps_ledger() {
    let (_tmp, mut conn) = setup_db();
    let order_id = create(&mut conn, "org:acme", vec![item("10.00", 1, "EUR")]);

    apply_engine_command(
        EngineCommand::DeleteOrder {
            order_id: order_id.clone(),
        },
        &mut conn,
        &directory(),
    )
    .unwrap();

    let orders: i64 = conn
        .query_row("SELECT COUNT(*) FROM orders", [], |r| r.get(0))
        .unwrap();
    let items: i64 = conn
        .query_row("SELECT COUNT(*) FROM order_items", [], |r| r.get(0))
        .unwrap();
    let ledger: i64 = conn
        .query_row("SELECT COUNT(*) FROM reference_entries", [], |r| r.get(0))
        .unwrap();
    assert_eq!(orders, 0);
    assert_eq!(items, 0);
    // Allocation history survives the order
    assert_eq!(ledger, 1);
}

#[test]
fn test_delete_missing_order() {
    let (_tmp, mut conn) = setup_db();

    let result = apply_engine_command(
        EngineCommand::DeleteOrder {
            order_id: "nope".to_string(),
        },
        &mut conn,
        &directory(),
    );

    let Err(err) = result else {
        panic!("Expected NotFound")
    };
    assert_eq!(err.kind(), DeskErrorKind::NotFound);
}

#[test]
fn test_get_by_reference() {
    let (_tmp, mut conn) = setup_db();
    let year = Utc::now().year();
    let order_id = create(&mut conn, "org:acme", vec![item("10.00", 1, "EUR")]);

    let found = order_query::order_get_by_reference(&format!("ACME-{}-1", year), &conn).unwrap();
    assert_eq!(found.id, order_id);
    assert_eq!(found.price.as_deref(), Some("10.00"));

    let missing = order_query::order_get_by_reference(&format!("ACME-{}-9", year), &conn);
    let Err(err) = missing else {
        panic!("Expected NotFound")
    };
    assert_eq!(err.kind(), DeskErrorKind::NotFound);
}

#[test]
fn test_get_recomputes_total_from_stale_row() {
    let (_tmp, mut conn) = setup_db();
    let order_id = create(&mut conn, "org:acme", vec![item("10.00", 2, "EUR")]);

    // Corrupt the stored total behind the engine's back
    conn.execute(
        "UPDATE orders SET price = '99.99' WHERE id = ?",
        [&order_id],
    )
    .unwrap();

    let order = order_query::order_get(&order_id, &conn).unwrap();
    assert_eq!(order.price.as_deref(), Some("20.00"));
    // The read did not write the correction back
    assert_eq!(stored_price(&conn, &order_id), "99.99");
}

#[test]
fn test_list_filters_by_organization() {
    let (_tmp, mut conn) = setup_db();
    let acme = create(&mut conn, "org:acme", vec![]);
    let _other = create(&mut conn, "org:other", vec![]);

    let page = order_query::order_list(
        &OrderFilters {
            organization: Some("org:acme".to_string()),
            ..OrderFilters::default()
        },
        &PaginationParams {
            cursor: None,
            limit: 10,
        },
        &conn,
    )
    .unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, acme);
    assert!(!page.has_more);
}

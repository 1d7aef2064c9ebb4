//! Repository integration tests: round-trips, year windows, unique indexes

use chrono::{TimeZone, Utc};
use orderdesk_core::errors::DeskErrorKind;
use orderdesk_core::model::{Order, OrderItem, ReferenceEntry};
use orderdesk_store::repo::{hydration, SqliteRepo};
use rusqlite::Connection;

fn setup_db() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    orderdesk_store::db::configure(&conn).unwrap();
    orderdesk_store::migrations::apply_migrations(&mut conn).unwrap();
    conn
}

fn referenced_order(id: &str, organization: &str, reference: &str, reference_id: i64) -> Order {
    let mut order = Order::new(id.to_string(), organization.to_string());
    order.reference = Some(reference.to_string());
    order.reference_id = Some(reference_id);
    order
}

#[test]
fn test_order_round_trip_with_items() {
    let conn = setup_db();

    let mut order = referenced_order("ord-1", "org:acme", "ACME-2026-1", 1);
    order.name = Some("Spring order".to_string());
    order.resources = vec!["res:a".to_string(), "res:b".to_string()];
    order.price = Some("25.50".to_string());
    order.price_currency = Some("EUR".to_string());
    SqliteRepo::persist_order(&conn, &order).unwrap();

    let mut item = OrderItem::new(
        "item-1".to_string(),
        "ord-1".to_string(),
        "offer:widget".to_string(),
        2,
        "10.00".to_string(),
        "EUR".to_string(),
    );
    item.tax_percentage = Some(21);
    SqliteRepo::persist_item(&conn, &item).unwrap();

    let loaded = SqliteRepo::get_order(&conn, "ord-1").unwrap().unwrap();
    assert_eq!(loaded.reference.as_deref(), Some("ACME-2026-1"));
    assert_eq!(loaded.name.as_deref(), Some("Spring order"));
    assert_eq!(loaded.resources, vec!["res:a", "res:b"]);
    assert_eq!(loaded.price.as_deref(), Some("25.50"));

    // Items come back through the hydration layer
    let store = hydration::load_store(&conn).unwrap();
    let hydrated = store.get_order("ord-1").unwrap();
    assert_eq!(hydrated.items.len(), 1);
    assert_eq!(hydrated.items[0].tax_percentage, Some(21));
    assert_eq!(hydrated.items[0].quantity, 2);
}

#[test]
fn test_upsert_updates_mutable_columns() {
    let conn = setup_db();

    let mut order = Order::new("ord-1".to_string(), "org:acme".to_string());
    SqliteRepo::persist_order(&conn, &order).unwrap();

    order.remark = Some("rush".to_string());
    order.price = Some("10.00".to_string());
    order.price_currency = Some("EUR".to_string());
    SqliteRepo::persist_order(&conn, &order).unwrap();

    let loaded = SqliteRepo::get_order(&conn, "ord-1").unwrap().unwrap();
    assert_eq!(loaded.remark.as_deref(), Some("rush"));
    assert_eq!(loaded.price.as_deref(), Some("10.00"));

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM orders", [], |r| r.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn test_max_reference_id_respects_year_window() {
    let conn = setup_db();

    let in_window = Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap();
    let out_of_window = Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap();

    let mut old = referenced_order("ord-1", "org:acme", "ACME-2026-7", 7);
    old.created_at = in_window;
    SqliteRepo::persist_order(&conn, &old).unwrap();

    let mut next = referenced_order("ord-2", "org:acme", "ACME-2027-9", 9);
    next.created_at = out_of_window;
    SqliteRepo::persist_order(&conn, &next).unwrap();

    let year_start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let year_end = Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap();

    // The last second of the year is inside the window; the next second out
    let max = SqliteRepo::max_reference_id(&conn, "org:acme", year_start, year_end).unwrap();
    assert_eq!(max, Some(7));

    // Other organizations never leak in
    let other = SqliteRepo::max_reference_id(&conn, "org:other", year_start, year_end).unwrap();
    assert_eq!(other, None);
}

#[test]
fn test_reference_probes() {
    let conn = setup_db();
    SqliteRepo::persist_order(&conn, &referenced_order("ord-1", "org:acme", "ACME-2026-1", 1))
        .unwrap();

    assert!(SqliteRepo::exists_with_reference(&conn, "ACME-2026-1").unwrap());
    assert!(!SqliteRepo::exists_with_reference(&conn, "ACME-2026-2").unwrap());

    assert_eq!(
        SqliteRepo::find_by_reference(&conn, "ACME-2026-1").unwrap(),
        Some("ord-1".to_string())
    );
    assert_eq!(SqliteRepo::find_by_reference(&conn, "nope").unwrap(), None);
}

#[test]
fn test_duplicate_reference_maps_to_concurrency() {
    let conn = setup_db();
    SqliteRepo::persist_order(&conn, &referenced_order("ord-1", "org:acme", "ACME-2026-1", 1))
        .unwrap();

    // Different order id, same reference string
    let clash = referenced_order("ord-2", "org:acme", "ACME-2026-1", 2);
    let err = SqliteRepo::persist_order(&conn, &clash).unwrap_err();

    assert_eq!(err.kind(), DeskErrorKind::Concurrency);
    assert!(err.kind().is_retryable());
}

#[test]
fn test_duplicate_org_year_reference_id_rejected() {
    let conn = setup_db();
    let created = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

    let mut first = referenced_order("ord-1", "org:acme", "ACME-2026-1", 1);
    first.created_at = created;
    SqliteRepo::persist_order(&conn, &first).unwrap();

    // Distinct reference string but the same (organization, year, id) slot
    let mut clash = referenced_order("ord-2", "org:acme", "ACME-2026-01", 1);
    clash.created_at = created;
    let err = SqliteRepo::persist_order(&conn, &clash).unwrap_err();

    assert_eq!(err.kind(), DeskErrorKind::Concurrency);

    // The same id in a different year is fine
    let mut next_year = referenced_order("ord-3", "org:acme", "ACME-2027-1", 1);
    next_year.created_at = Utc.with_ymd_and_hms(2027, 3, 1, 12, 0, 0).unwrap();
    SqliteRepo::persist_order(&conn, &next_year).unwrap();
}

#[test]
fn test_delete_order_cascades_to_items() {
    let mut conn = setup_db();

    SqliteRepo::persist_order(&conn, &Order::new("ord-1".to_string(), "org:acme".to_string()))
        .unwrap();
    SqliteRepo::persist_item(
        &conn,
        &OrderItem::new(
            "item-1".to_string(),
            "ord-1".to_string(),
            "offer:widget".to_string(),
            1,
            "10.00".to_string(),
            "EUR".to_string(),
        ),
    )
    .unwrap();

    let tx = conn.transaction().unwrap();
    assert!(SqliteRepo::delete_order_tx(&tx, "ord-1").unwrap());
    tx.commit().unwrap();

    let items: i64 = conn
        .query_row("SELECT COUNT(*) FROM order_items", [], |r| r.get(0))
        .unwrap();
    assert_eq!(items, 0);
}

#[test]
fn test_reference_ledger_appends() {
    let mut conn = setup_db();
    SqliteRepo::persist_order(&conn, &Order::new("ord-1".to_string(), "org:acme".to_string()))
        .unwrap();

    let tx = conn.transaction().unwrap();
    let first = SqliteRepo::persist_reference_entry_tx(&tx, &ReferenceEntry::new("ord-1".to_string()))
        .unwrap();
    let second =
        SqliteRepo::persist_reference_entry_tx(&tx, &ReferenceEntry::new("ord-1".to_string()))
            .unwrap();
    tx.commit().unwrap();

    assert!(second > first);

    let entries = SqliteRepo::list_reference_entries(&conn, "ord-1").unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, first);
    assert!(entries[0].is_persisted());
}

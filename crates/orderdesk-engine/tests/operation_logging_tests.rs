//! Logging boundary tests: command handlers emit start/end/end_error events
//!
//! The capture subscriber is process-wide and shared by every test in this
//! binary, so assertions filter by op and event type instead of counting.

use orderdesk_core::logging_facility::init_test_capture;
use orderdesk_core::{Organization, StaticDirectory};
use orderdesk_engine::commands::order::{order_create, ItemDraft, OrderDraft};
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
    directory
}

#[test]
fn test_create_emits_start_and_end_boundary() {
    let capture = init_test_capture();
    let (_tmp, mut conn) = setup_db();

    let order_id = order_create(
        OrderDraft {
            organization: "org:acme".to_string(),
            items: vec![ItemDraft {
                offer: "offer:widget".to_string(),
                quantity: 2,
                price: "10.00".to_string(),
                price_currency: "EUR".to_string(),
                tax_percentage: None,
            }],
            ..OrderDraft::default()
        },
        &mut conn,
        &directory(),
    )
    .unwrap();

    capture.assert_boundary("order_create");
    capture.assert_event_exists("order_create", "start");

    // The end event carries the created order's id
    let ended = capture
        .events_for_op("order_create")
        .into_iter()
        .find(|e| e.event.as_deref() == Some("end") && e.field("order_id") == Some(order_id.as_str()));
    assert!(ended.is_some(), "no end event carrying order_id {}", order_id);
}

#[test]
fn test_failed_create_emits_end_error_with_code() {
    let capture = init_test_capture();
    let (_tmp, mut conn) = setup_db();

    let result = order_create(
        OrderDraft {
            organization: "org:missing".to_string(),
            ..OrderDraft::default()
        },
        &mut conn,
        &directory(),
    );
    assert!(result.is_err());

    let errored = capture
        .events_for_op("order_create")
        .into_iter()
        .find(|e| e.event.as_deref() == Some("end_error"));
    let Some(errored) = errored else {
        panic!("no end_error event for order_create")
    };
    assert_eq!(errored.field("err_code"), Some("ERR_ORGANIZATION_NOT_FOUND"));
    assert!(errored.field("duration_ms").is_some());
}

#[test]
fn test_query_emits_boundary() {
    let capture = init_test_capture();
    let (_tmp, mut conn) = setup_db();

    let order_id = order_create(
        OrderDraft {
            organization: "org:acme".to_string(),
            ..OrderDraft::default()
        },
        &mut conn,
        &directory(),
    )
    .unwrap();

    order_query::order_get(&order_id, &conn).unwrap();

    capture.assert_boundary("order_get");
    capture.assert_event_exists("order_get", "end");
}

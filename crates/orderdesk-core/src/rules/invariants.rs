use std::collections::HashMap;

use chrono::Datelike;

use crate::ops::Store;

/// Find reference strings carried by more than one order
///
/// References are globally unique once allocated, so any bucket with two or
/// more orders is a violation.
///
/// Returns list of (reference, order_ids) tuples, order ids sorted
pub fn find_duplicate_references(store: &Store) -> Vec<(String, Vec<String>)> {
    let mut by_reference: HashMap<String, Vec<String>> = HashMap::new();

    for order in store.list_orders() {
        if let Some(ref reference) = order.reference {
            by_reference
                .entry(reference.clone())
                .or_default()
                .push(order.id.clone());
        }
    }

    by_reference
        .into_iter()
        .filter(|(_, order_ids)| order_ids.len() > 1)
        .map(|(reference, mut order_ids)| {
            order_ids.sort();
            (reference, order_ids)
        })
        .collect()
}

/// Find reference ids shared by orders of the same organization and year
///
/// The per-year counter restarts each January, so the same id may recur
/// across years but never within one organization-year.
///
/// Returns list of (organization, year, reference_id, order_ids) tuples
pub fn find_reference_id_conflicts(store: &Store) -> Vec<(String, i32, i64, Vec<String>)> {
    let mut by_slot: HashMap<(String, i32, i64), Vec<String>> = HashMap::new();

    for order in store.list_orders() {
        if let Some(reference_id) = order.reference_id {
            let key = (
                order.organization.clone(),
                order.created_at.year(),
                reference_id,
            );
            by_slot.entry(key).or_default().push(order.id.clone());
        }
    }

    by_slot
        .into_iter()
        .filter(|(_, order_ids)| order_ids.len() > 1)
        .map(|((organization, year, reference_id), mut order_ids)| {
            order_ids.sort();
            (organization, year, reference_id, order_ids)
        })
        .collect()
}

/// Find items whose order_id disagrees with the order holding them
///
/// Returns list of (order_id, item_id) tuples
pub fn find_item_ownership_mismatches(store: &Store) -> Vec<(String, String)> {
    let mut mismatches = Vec::new();

    for order in store.list_orders() {
        for item in &order.items {
            if item.order_id != order.id {
                mismatches.push((order.id.clone(), item.id.clone()));
            }
        }
    }

    mismatches
}

/// Find orders where reference and reference id were not assigned together
///
/// Allocation sets both fields in one step; one without the other means a
/// write was torn.
///
/// Returns list of order id strings
pub fn find_partial_references(store: &Store) -> Vec<String> {
    let mut partial = Vec::new();

    for order in store.list_orders() {
        if order.reference.is_some() != order.reference_id.is_some() {
            partial.push(order.id.clone());
        }
    }

    partial
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Order, OrderItem};

    fn order_with_reference(id: &str, organization: &str, reference: &str, rid: i64) -> Order {
        let mut order = Order::new(id.to_string(), organization.to_string());
        order.reference = Some(reference.to_string());
        order.reference_id = Some(rid);
        order
    }

    #[test]
    fn test_find_duplicate_references() {
        let mut store = Store::new();
        store.insert_order(order_with_reference("o1", "org:acme", "ACME-2026-1", 1));
        store.insert_order(order_with_reference("o2", "org:acme", "ACME-2026-1", 2));
        store.insert_order(order_with_reference("o3", "org:acme", "ACME-2026-3", 3));

        let duplicates = find_duplicate_references(&store);
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].0, "ACME-2026-1");
        assert_eq!(duplicates[0].1, vec!["o1".to_string(), "o2".to_string()]);
    }

    #[test]
    fn test_find_reference_id_conflicts_same_year() {
        let mut store = Store::new();
        store.insert_order(order_with_reference("o1", "org:acme", "ACME-2026-7", 7));
        store.insert_order(order_with_reference("o2", "org:acme", "ACME-2026-7b", 7));

        let conflicts = find_reference_id_conflicts(&store);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].0, "org:acme");
        assert_eq!(conflicts[0].2, 7);
        assert_eq!(conflicts[0].3, vec!["o1".to_string(), "o2".to_string()]);
    }

    #[test]
    fn test_reference_id_reuse_across_organizations_is_fine() {
        let mut store = Store::new();
        store.insert_order(order_with_reference("o1", "org:acme", "ACME-2026-1", 1));
        store.insert_order(order_with_reference("o2", "org:other", "OTHER-2026-1", 1));

        assert!(find_reference_id_conflicts(&store).is_empty());
    }

    #[test]
    fn test_find_item_ownership_mismatches() {
        let mut store = Store::new();
        let mut order = Order::new("o1".to_string(), "org:acme".to_string());
        order.items.push(OrderItem::new(
            "i1".to_string(),
            "somebody-else".to_string(),
            "offer:x".to_string(),
            1,
            "1.00".to_string(),
            "EUR".to_string(),
        ));
        store.insert_order(order);

        let mismatches = find_item_ownership_mismatches(&store);
        assert_eq!(mismatches, vec![("o1".to_string(), "i1".to_string())]);
    }

    #[test]
    fn test_find_partial_references() {
        let mut store = Store::new();
        let mut torn = Order::new("o1".to_string(), "org:acme".to_string());
        torn.reference = Some("ACME-2026-1".to_string());
        // reference_id missing
        store.insert_order(torn);
        store.insert_order(Order::new("o2".to_string(), "org:acme".to_string()));

        let partial = find_partial_references(&store);
        assert_eq!(partial, vec!["o1".to_string()]);
    }
}

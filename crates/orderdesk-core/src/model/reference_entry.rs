use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ReferenceEntry - ledger row recording one successful reference allocation
///
/// One entry is written per allocated order reference. The allocator itself
/// never reads the ledger (the max scan runs over orders); the entries exist
/// so the allocation sequence can be audited after the fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    /// Store-assigned sequence number; 0 until persisted
    pub id: i64,

    /// Id of the order the reference was allocated for
    pub order_id: String,

    /// Timestamp when the allocation happened
    pub created_at: DateTime<Utc>,
}

impl ReferenceEntry {
    /// Create a new unpersisted entry for an order
    pub fn new(order_id: String) -> Self {
        Self {
            id: 0,
            order_id,
            created_at: Utc::now(),
        }
    }

    /// Whether the store has assigned this entry its sequence number yet
    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_is_unpersisted() {
        let entry = ReferenceEntry::new("ord-1".to_string());
        assert_eq!(entry.order_id, "ord-1");
        assert!(!entry.is_persisted());
    }

    #[test]
    fn test_persisted_entry() {
        let mut entry = ReferenceEntry::new("ord-1".to_string());
        entry.id = 7;
        assert!(entry.is_persisted());
    }
}

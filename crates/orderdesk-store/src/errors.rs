//! Error handling for orderdesk-store
//!
//! Wraps orderdesk-core DeskError with store-specific helpers

use orderdesk_core::errors::{DeskError, DeskErrorKind};

/// Result type alias using DeskError
pub type Result<T> = std::result::Result<T, DeskError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> DeskError {
    DeskError::new(DeskErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> DeskError {
    DeskError::new(DeskErrorKind::Internal)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create a database error from rusqlite::Error
///
/// Unique-constraint failures map to the Concurrency kind; they signal that
/// another writer won a reference slot and the operation can be retried.
/// Everything else maps to Persistence.
pub fn from_rusqlite(err: rusqlite::Error) -> DeskError {
    let kind = match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation
                && (failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY) =>
        {
            DeskErrorKind::Concurrency
        }
        _ => DeskErrorKind::Persistence,
    };

    DeskError::new(kind)
        .with_op("sqlite")
        .with_message(err.to_string())
}

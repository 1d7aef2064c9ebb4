//! Canonical logging macros
//!
//! These macros provide a structured, consistent way to log operations.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use orderdesk_core::log_op_start;
/// log_op_start!("order_create");
/// log_op_start!("order_create", organization = "org:acme");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = orderdesk_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = orderdesk_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use orderdesk_core::log_op_end;
/// log_op_end!("order_create", duration_ms = 42);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = orderdesk_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = orderdesk_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// # Example
///
/// ```ignore
/// # use orderdesk_core::{log_op_error, errors::OrderDeskError};
/// let err = OrderDeskError::OrderNotFound { order_id: "o1".to_string() };
/// log_op_error!("order_get", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        use $crate::errors::DeskError;
        let desk_err: DeskError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = orderdesk_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?desk_err.kind(),
            err_code = desk_err.code(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        use $crate::errors::DeskError;
        let desk_err: DeskError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = orderdesk_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?desk_err.kind(),
            err_code = desk_err.code(),
            $($field)*
        );
    }};
}

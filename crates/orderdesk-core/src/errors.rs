use orderdesk_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using OrderDeskError
pub type Result<T> = std::result::Result<T, OrderDeskError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// This taxonomy provides a stable, structured classification of all errors
/// in the OrderDesk system. Each kind maps to a stable error code that can be
/// used for programmatic error handling, testing, and external API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeskErrorKind {
    // Reference allocation
    OrganizationNotFound,
    AllocationFailed,

    // Pricing
    InvalidPriceFormat,
    MixedCurrency,
    AmountOverflow,

    // Structural/Validation
    InvalidInput,
    NotFound,
    AlreadyExists,

    // Integration/IO
    Serialization,
    Persistence,
    Concurrency,

    // Internal
    Internal,
}

impl DeskErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            DeskErrorKind::OrganizationNotFound => "ERR_ORGANIZATION_NOT_FOUND",
            DeskErrorKind::AllocationFailed => "ERR_ALLOCATION_FAILED",
            DeskErrorKind::InvalidPriceFormat => "ERR_INVALID_PRICE_FORMAT",
            DeskErrorKind::MixedCurrency => "ERR_MIXED_CURRENCY",
            DeskErrorKind::AmountOverflow => "ERR_AMOUNT_OVERFLOW",
            DeskErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            DeskErrorKind::NotFound => "ERR_NOT_FOUND",
            DeskErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            DeskErrorKind::Serialization => "ERR_SERIALIZATION",
            DeskErrorKind::Persistence => "ERR_PERSISTENCE",
            DeskErrorKind::Concurrency => "ERR_CONCURRENCY",
            DeskErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether a failed unit of work may be retried as-is by the caller
    ///
    /// Only contention is retryable: allocation retry budget exhaustion and
    /// storage conflicts. Everything else needs a changed request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DeskErrorKind::AllocationFailed | DeskErrorKind::Concurrency
        )
    }
}

/// Canonical structured error type
///
/// This error type provides a structured representation of errors with
/// classification fields for programmatic handling and rich context for
/// debugging.
#[derive(Debug, Clone)]
pub struct DeskError {
    kind: DeskErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    organization: Option<String>,
    reference: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    source: Option<Box<DeskError>>,
}

impl DeskError {
    /// Create a new error with the specified kind
    pub fn new(kind: DeskErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            organization: None,
            reference: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context (order or item id)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add organization context
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Add order reference context
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add trace ID context
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: DeskError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> DeskErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the organization context, if any
    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref()
    }

    /// Get the order reference context, if any
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// Get the request ID context, if any
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Get the trace ID context, if any
    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&DeskError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for DeskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(organization) = &self.organization {
            write!(f, " (organization: {})", organization)?;
        }
        if let Some(reference) = &self.reference {
            write!(f, " (reference: {})", reference)?;
        }
        Ok(())
    }
}

impl std::error::Error for DeskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

// ========== End Error Facility ==========

/// Comprehensive error taxonomy for OrderDesk operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderDeskError {
    // ===== Reference Allocation Errors =====
    /// Organization lookup failed
    #[error("Organization not found: {organization}")]
    OrganizationNotFound { organization: String },

    /// Retry budget exhausted while allocating a reference under contention
    #[error("Reference allocation failed for {organization} after {attempts} attempts")]
    AllocationFailed { organization: String, attempts: u32 },

    // ===== Pricing Errors =====
    /// Item unit price is not a parseable decimal amount
    #[error("Invalid price format on item {item_id}: {price:?}")]
    InvalidPriceFormat { item_id: String, price: String },

    /// Item currency differs from the currency accumulated so far
    #[error("Mixed currencies on order: accumulating {expected}, item {item_id} priced in {found}")]
    MixedCurrencyUnsupported {
        expected: String,
        found: String,
        item_id: String,
    },

    /// Minor-unit arithmetic exceeded i64 range
    #[error("Amount overflow while totalling order {order_id}")]
    AmountOverflow { order_id: String },

    /// Currency code is not a valid ISO 4217 alpha code
    #[error("Invalid currency code: {currency:?}")]
    InvalidCurrency { currency: String },

    // ===== Structural Errors =====
    /// Order not found in store
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: String },

    /// Order item not found on the given order
    #[error("Order item not found: {item_id} on order {order_id}")]
    ItemNotFound { order_id: String, item_id: String },

    /// Order already exists (duplicate ID)
    #[error("Order already exists: {order_id}")]
    AlreadyExists { order_id: String },

    // ===== Integrity Violations =====
    /// Two or more orders carry the same reference string
    #[error("Duplicate reference {reference} on orders {order_ids:?}")]
    DuplicateReference {
        reference: String,
        order_ids: Vec<String>,
    },

    /// Two or more orders share a reference id within one organization-year
    #[error("Reference id {reference_id} duplicated for {organization} in {year}")]
    ReferenceIdConflict {
        organization: String,
        year: i32,
        reference_id: i64,
    },

    /// An item in an order's collection claims a different owning order
    #[error("Item {item_id} held by order {order_id} claims a different owner")]
    ItemOwnershipMismatch { order_id: String, item_id: String },

    /// Reference string and reference id were not assigned together
    #[error("Order {order_id} has a partially assigned reference")]
    PartialReference { order_id: String },

    // ===== Validation Errors =====
    /// A field failed validation
    #[error("Invalid {field}: {reason}")]
    ValidationFailed { field: String, reason: String },

    // ===== Generic Errors =====
    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Conversion from OrderDeskError to DeskError
///
/// The typed domain errors travel through the ops layer; the structured
/// facility form is what crosses the command boundary and gets logged.
impl From<OrderDeskError> for DeskError {
    fn from(err: OrderDeskError) -> Self {
        match err {
            OrderDeskError::OrganizationNotFound { organization } => {
                DeskError::new(DeskErrorKind::OrganizationNotFound)
                    .with_organization(organization)
                    .with_message("Organization not found")
            }

            OrderDeskError::AllocationFailed {
                organization,
                attempts,
            } => DeskError::new(DeskErrorKind::AllocationFailed)
                .with_organization(organization)
                .with_message(format!(
                    "Reference allocation failed after {} attempts",
                    attempts
                )),

            OrderDeskError::InvalidPriceFormat { item_id, price } => {
                DeskError::new(DeskErrorKind::InvalidPriceFormat)
                    .with_entity_id(item_id)
                    .with_message(format!("Invalid price format: {:?}", price))
            }

            OrderDeskError::MixedCurrencyUnsupported {
                expected,
                found,
                item_id,
            } => DeskError::new(DeskErrorKind::MixedCurrency)
                .with_entity_id(item_id)
                .with_message(format!(
                    "Order accumulates {}, item priced in {}",
                    expected, found
                )),

            OrderDeskError::AmountOverflow { order_id } => {
                DeskError::new(DeskErrorKind::AmountOverflow)
                    .with_entity_id(order_id)
                    .with_message("Amount overflow while totalling order")
            }

            OrderDeskError::InvalidCurrency { currency } => {
                DeskError::new(DeskErrorKind::InvalidInput)
                    .with_message(format!("Invalid currency code: {:?}", currency))
            }

            OrderDeskError::OrderNotFound { order_id } => DeskError::new(DeskErrorKind::NotFound)
                .with_entity_id(order_id)
                .with_message("Order not found"),

            OrderDeskError::ItemNotFound { order_id, item_id } => {
                DeskError::new(DeskErrorKind::NotFound)
                    .with_entity_id(item_id)
                    .with_message(format!("Item not found on order {}", order_id))
            }

            OrderDeskError::AlreadyExists { order_id } => {
                DeskError::new(DeskErrorKind::AlreadyExists)
                    .with_entity_id(order_id)
                    .with_message("Order already exists")
            }

            OrderDeskError::DuplicateReference {
                reference,
                order_ids,
            } => DeskError::new(DeskErrorKind::AlreadyExists)
                .with_reference(reference)
                .with_message(format!("Duplicate reference on orders {:?}", order_ids)),

            OrderDeskError::ReferenceIdConflict {
                organization,
                year,
                reference_id,
            } => DeskError::new(DeskErrorKind::AlreadyExists)
                .with_organization(organization)
                .with_message(format!(
                    "Reference id {} duplicated in {}",
                    reference_id, year
                )),

            OrderDeskError::ItemOwnershipMismatch { order_id, item_id } => {
                DeskError::new(DeskErrorKind::Internal)
                    .with_entity_id(item_id)
                    .with_message(format!(
                        "Item held by order {} claims a different owner",
                        order_id
                    ))
            }

            OrderDeskError::PartialReference { order_id } => {
                DeskError::new(DeskErrorKind::Internal)
                    .with_entity_id(order_id)
                    .with_message("Reference and reference id not assigned together")
            }

            OrderDeskError::ValidationFailed { field, reason } => {
                DeskError::new(DeskErrorKind::InvalidInput)
                    .with_message(format!("Invalid {}: {}", field, reason))
            }

            OrderDeskError::Serialization { message } => {
                DeskError::new(DeskErrorKind::Serialization).with_message(message)
            }

            OrderDeskError::Internal { message } => {
                DeskError::new(DeskErrorKind::Internal).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to OrderDeskError
impl From<serde_json::Error> for OrderDeskError {
    fn from(err: serde_json::Error) -> Self {
        OrderDeskError::Serialization {
            message: err.to_string(),
        }
    }
}

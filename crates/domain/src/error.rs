//! Domain error types.

use common::{CustomerId, OrderId, OrderStatus, ProductId};
use order_store::StoreError;
use thiserror::Error;

use crate::customer::CustomerDirectoryError;

/// Broad classification of a [`DomainError`], used by callers to decide how
/// the failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is malformed. No side effects.
    Validation,
    /// The request is well formed but a lifecycle rule forbids it.
    BusinessRule,
    /// A referenced entity does not exist.
    NotFound,
    /// The request collides with existing state (e.g. a taken SKU).
    Conflict,
    /// A collaborating service failed or timed out.
    Downstream,
    /// Anything else. The unit of work was rolled back.
    Unexpected,
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An order must contain at least one line.
    #[error("Order must contain at least one item")]
    EmptyOrder,

    /// A line quantity is zero or negative.
    #[error("Invalid quantity {qty} for product {product_id}: must be greater than 0")]
    InvalidQuantity { product_id: ProductId, qty: i64 },

    /// The idempotency key is absent or blank.
    #[error("Idempotency key is required")]
    MissingIdempotencyKey,

    /// The idempotency key exceeds the stored column size.
    #[error("Idempotency key must be at most {max} characters")]
    IdempotencyKeyTooLong { max: usize },

    /// Catalog input failed validation.
    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    /// The customer could not be resolved by the customer directory.
    #[error("Customer not found: {0}")]
    UnknownCustomer(CustomerId),

    /// An order line references a product that does not exist.
    #[error("Product not found: {0}")]
    UnknownProduct(ProductId),

    /// A line asks for more than the product has in stock.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// The order is in a status that cannot be confirmed.
    #[error("Order {order_id} cannot be confirmed from {status} status")]
    NotConfirmable {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// The order was already canceled.
    #[error("Order {0} is already canceled")]
    AlreadyCanceled(OrderId),

    /// A confirmed order is past its cancellation window.
    #[error("Cancellation window expired for order {order_id}: {elapsed_secs}s since creation")]
    CancellationWindowExpired { order_id: OrderId, elapsed_secs: i64 },

    /// A product with the same SKU already exists.
    #[error("Product with SKU {0} already exists")]
    DuplicateSku(String),

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The customer directory failed.
    #[error("Customer directory error: {0}")]
    CustomerDirectory(#[from] CustomerDirectoryError),

    /// An error occurred in the order store.
    #[error("Order store error: {0}")]
    Store(StoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyOrder
            | Self::InvalidQuantity { .. }
            | Self::MissingIdempotencyKey
            | Self::IdempotencyKeyTooLong { .. }
            | Self::InvalidProduct(_)
            | Self::UnknownCustomer(_)
            | Self::UnknownProduct(_) => ErrorKind::Validation,
            Self::InsufficientStock { .. }
            | Self::NotConfirmable { .. }
            | Self::AlreadyCanceled(_)
            | Self::CancellationWindowExpired { .. } => ErrorKind::BusinessRule,
            Self::OrderNotFound(_) | Self::ProductNotFound(_) => ErrorKind::NotFound,
            Self::DuplicateSku(_) => ErrorKind::Conflict,
            Self::CustomerDirectory(_) => ErrorKind::Downstream,
            Self::Store(_) | Self::Serialization(_) => ErrorKind::Unexpected,
        }
    }

    /// Short label for the violated rule, used as a metric label.
    pub fn rule(&self) -> Option<&'static str> {
        match self {
            Self::InsufficientStock { .. } => Some("insufficient_stock"),
            Self::NotConfirmable { .. } => Some("not_confirmable"),
            Self::AlreadyCanceled(_) => Some("already_canceled"),
            Self::CancellationWindowExpired { .. } => Some("cancellation_window_expired"),
            _ => None,
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateSku(sku) => DomainError::DuplicateSku(sku),
            StoreError::OrderNotFound(id) => DomainError::OrderNotFound(id),
            StoreError::ProductNotFound(id) => DomainError::ProductNotFound(id),
            other => DomainError::Store(other),
        }
    }
}

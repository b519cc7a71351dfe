use thiserror::Error;

use crate::{OrderId, ProductId};

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A product with the same SKU already exists.
    #[error("Duplicate SKU: {0}")]
    DuplicateSku(String),

    /// A stock adjustment would drive the product's stock below zero.
    #[error("Stock for product {product_id} cannot go below zero")]
    StockUnderflow { product_id: ProductId },

    /// A write targeted a product row that does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A write targeted an order row that does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// A stored row could not be decoded into a model.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

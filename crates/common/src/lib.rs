//! Shared identifier and status types used across the order services.

pub mod search;
pub mod status;
pub mod types;

pub use search::like_contains;
pub use status::{OrderStatus, UnknownStatus};
pub use types::{CustomerId, OrderId, ProductId};

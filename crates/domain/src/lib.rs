//! Domain layer for the order lifecycle.
//!
//! This crate provides:
//! - `OrderService`: stock reservation, idempotent confirmation and
//!   time-boxed cancellation over an `OrderStore`
//! - `CatalogService`: product catalog maintenance
//! - `CustomerDirectory`: the port used to check that a customer exists
//! - `FixedClock`: a test clock for the `mockable::Clock` time source

pub mod catalog;
pub mod clock;
pub mod customer;
pub mod error;
pub mod order;

pub use catalog::{CatalogService, ProductPage, ProductView};
pub use clock::{Clock, DefaultClock, FixedClock};
pub use common::{CustomerId, OrderId, OrderStatus, ProductId};
pub use customer::{Customer, CustomerDirectory, CustomerDirectoryError, InMemoryCustomerDirectory};
pub use error::{DomainError, ErrorKind};
pub use order::{
    CONFIRM_TARGET, CancellationResponse, Confirmation, ConfirmationResponse, Money, OrderItemView,
    OrderLine, OrderService, OrderServiceConfig, OrderSummary, OrderView,
};

//! Storage layer for the order lifecycle.
//!
//! Every multi-step mutation runs inside a [`UnitOfWork`]: an all-or-nothing
//! transaction that can take exclusive locks on product and order rows.
//! Dropping a unit of work without committing rolls it back.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::{CustomerId, OrderId, OrderStatus, ProductId};
pub use error::{Result, StoreError};
pub use memory::{InMemoryOrderStore, InMemoryUnitOfWork};
pub use model::{
    IdempotencyRecord, NewOrder, NewOrderItem, NewProduct, OrderItemRecord, OrderRecord,
    OrderWithItems, Product, ProductPatch,
};
pub use postgres::{PostgresOrderStore, PostgresUnitOfWork};
pub use query::{OrderQuery, ProductQuery};
pub use store::{OrderStore, UnitOfWork};

//! Order lifecycle: CREATED → CONFIRMED → CANCELED.

pub mod rules;
mod service;
mod value_objects;
mod views;

pub use service::{CONFIRM_TARGET, OrderService, OrderServiceConfig};
pub use value_objects::{Money, OrderLine};
pub use views::{
    CancellationResponse, Confirmation, ConfirmationResponse, OrderItemView, OrderSummary,
    OrderView,
};

//! HTTP clients for the services the order lifecycle talks to.
//!
//! Each client owns transport details only: URL building, bearer auth,
//! timeouts and HTTP error mapping. No request is ever retried.

pub mod config;
pub mod customers;
pub mod error;
pub mod orders;

pub use config::{ClientConfig, DEFAULT_TIMEOUT};
pub use customers::HttpCustomerDirectory;
pub use error::ClientError;
pub use orders::{HttpOrdersClient, IDEMPOTENCY_KEY_HEADER};

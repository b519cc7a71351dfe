//! Route handlers.

pub mod orders;
pub mod products;
pub mod system;

use domain::{
    CatalogService, Clock, CustomerDirectory, DefaultClock, OrderService, OrderServiceConfig,
};
use order_store::OrderStore;

/// Shared application state accessible from all handlers.
pub struct AppState<S, C, K = DefaultClock> {
    pub orders: OrderService<S, C, K>,
    pub catalog: CatalogService<S>,
}

impl<S, C, K> AppState<S, C, K>
where
    S: OrderStore + Clone,
    C: CustomerDirectory,
    K: Clock,
{
    /// Builds both services over the same store.
    pub fn new(store: S, customers: C, clock: K, config: OrderServiceConfig) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            orders: OrderService::with_clock(store, customers, clock, config),
        }
    }
}

use crate::{OrderStatus, ProductId};

/// Default page size for list queries.
pub const DEFAULT_LIMIT: usize = 10;

/// Largest page size a list query will return.
pub const MAX_LIMIT: usize = 100;

fn clamp_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_LIMIT)
}

/// Builder for listing orders, newest first.
#[derive(Debug, Clone)]
pub struct OrderQuery {
    /// Filter by status.
    pub status: Option<OrderStatus>,

    /// Maximum number of orders to return.
    pub limit: usize,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            status: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl OrderQuery {
    /// Creates a query with the default page size and no filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by status.
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the page size, clamped to `1..=MAX_LIMIT`.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = clamp_limit(limit);
        self
    }
}

/// Builder for cursor-paginated product listings, ascending by id.
#[derive(Debug, Clone)]
pub struct ProductQuery {
    /// Case-insensitive substring matched against name or SKU.
    pub search: Option<String>,

    /// Only products with an id greater than this are returned.
    pub cursor: Option<ProductId>,

    /// Maximum number of products to return.
    pub limit: usize,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            search: None,
            cursor: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ProductQuery {
    /// Creates a query with the default page size and no filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by a search term. Blank terms are ignored.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = if term.trim().is_empty() {
            None
        } else {
            Some(term.trim().to_string())
        };
        self
    }

    /// Starts after the given product id.
    pub fn after(mut self, cursor: ProductId) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Sets the page size, clamped to `1..=MAX_LIMIT`.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = clamp_limit(limit);
        self
    }

    /// Returns true if the product matches the search term.
    pub fn matches(&self, name: &str, sku: &str) -> bool {
        match &self.search {
            Some(term) => {
                let term = term.to_lowercase();
                name.to_lowercase().contains(&term) || sku.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}

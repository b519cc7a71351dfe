//! Customer registration and search inputs.

use serde::Deserialize;
use validator::Validate;

/// Page size when a search names none.
pub const DEFAULT_LIMIT: usize = 10;

/// Largest page a search may request.
pub const MAX_LIMIT: usize = 100;

/// A customer to register.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct NewCustomer {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 5, message = "Phone is required"))]
    pub phone: String,
}

/// Filters for listing customers, ascending by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerQuery {
    /// Case-insensitive substring of the name or email.
    pub search: Option<String>,
    pub limit: usize,
}

impl CustomerQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank terms are ignored.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = (!term.trim().is_empty()).then_some(term);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(MAX_LIMIT);
        self
    }

    /// Returns true if a customer with this name and email passes the filter.
    pub fn matches(&self, name: &str, email: &str) -> bool {
        let Some(term) = &self.search else {
            return true;
        };
        let term = term.to_lowercase();
        name.to_lowercase().contains(&term) || email.to_lowercase().contains(&term)
    }
}

impl Default for CustomerQuery {
    fn default() -> Self {
        Self {
            search: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(name: &str, email: &str, phone: &str) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(customer("Ada", "ada@example.com", "555-0100").validate().is_ok());
    }

    #[test]
    fn each_field_is_checked() {
        let errors = customer("", "not-an-email", "123").validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("phone"));
    }

    #[test]
    fn query_limit_is_capped_and_blank_search_dropped() {
        let query = CustomerQuery::new().search("  ").limit(5_000);
        assert_eq!(query.search, None);
        assert_eq!(query.limit, MAX_LIMIT);
        assert_eq!(CustomerQuery::new().limit, DEFAULT_LIMIT);
    }

    #[test]
    fn search_matches_name_or_email_ignoring_case() {
        let query = CustomerQuery::new().search("LOVE");
        assert!(query.matches("Ada Lovelace", "ada@example.com"));
        assert!(query.matches("Ada", "lovelace@example.com"));
        assert!(!query.matches("Grace Hopper", "grace@example.com"));
    }
}

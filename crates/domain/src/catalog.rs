//! Product catalog operations.
//!
//! Catalog writes sit outside the order lifecycle. Setting stock here is a
//! restock and never touches orders.

use common::ProductId;
use order_store::{NewProduct, OrderStore, Product, ProductPatch, ProductQuery};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A product as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductView {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
}

impl From<Product> for ProductView {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            sku: p.sku,
            name: p.name,
            price_cents: p.price_cents,
            stock: p.stock,
        }
    }
}

/// One page of a product listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub data: Vec<ProductView>,
    /// Id to pass as the cursor for the next page; None on the last page.
    pub next_cursor: Option<ProductId>,
}

/// Service for managing the product catalog.
pub struct CatalogService<S> {
    store: S,
}

impl<S: OrderStore> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Adds a product. The SKU must be unique.
    #[tracing::instrument(skip(self, product), fields(sku = %product.sku))]
    pub async fn create_product(&self, product: NewProduct) -> Result<ProductView, DomainError> {
        let product = NewProduct {
            sku: product.sku.trim().to_string(),
            name: product.name.trim().to_string(),
            ..product
        };
        if product.sku.is_empty() {
            return Err(DomainError::InvalidProduct("sku is required".into()));
        }
        if product.name.is_empty() {
            return Err(DomainError::InvalidProduct("name is required".into()));
        }
        validate_price(product.price_cents)?;
        validate_stock(product.stock)?;

        let created = self.store.insert_product(product).await?;
        tracing::info!(product_id = %created.id, "product created");
        Ok(created.into())
    }

    /// Changes price and/or sets the on-hand stock level of a product.
    #[tracing::instrument(skip(self))]
    pub async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<ProductView, DomainError> {
        if patch.is_empty() {
            return Err(DomainError::InvalidProduct(
                "price_cents or stock must be provided".into(),
            ));
        }
        if let Some(price_cents) = patch.price_cents {
            validate_price(price_cents)?;
        }
        if let Some(stock) = patch.stock {
            validate_stock(stock)?;
        }

        let updated = self
            .store
            .update_product(id, patch)
            .await?
            .ok_or(DomainError::ProductNotFound(id))?;
        tracing::info!(stock = updated.stock, price_cents = updated.price_cents, "product updated");
        Ok(updated.into())
    }

    /// Loads a product by ID.
    ///
    /// Returns None if the product doesn't exist.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<ProductView>, DomainError> {
        Ok(self.store.get_product(id).await?.map(ProductView::from))
    }

    /// Lists one page of products, ascending by id.
    pub async fn list_products(&self, query: ProductQuery) -> Result<ProductPage, DomainError> {
        let limit = query.limit;
        let products = self.store.list_products(query).await?;
        let next_cursor = if products.len() == limit {
            products.last().map(|p| p.id)
        } else {
            None
        };
        Ok(ProductPage {
            data: products.into_iter().map(ProductView::from).collect(),
            next_cursor,
        })
    }
}

fn validate_price(price_cents: i64) -> Result<(), DomainError> {
    if price_cents <= 0 {
        return Err(DomainError::InvalidProduct(
            "price_cents must be greater than 0".into(),
        ));
    }
    Ok(())
}

fn validate_stock(stock: i64) -> Result<(), DomainError> {
    if stock < 0 {
        return Err(DomainError::InvalidProduct("stock must not be negative".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use order_store::InMemoryOrderStore;

    use super::*;
    use crate::error::ErrorKind;

    fn new_product(sku: &str, price_cents: i64, stock: i64) -> NewProduct {
        NewProduct {
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            price_cents,
            stock,
        }
    }

    #[tokio::test]
    async fn test_create_product_validates_fields() {
        let catalog = CatalogService::new(InMemoryOrderStore::new());

        for bad in [
            new_product("", 100, 1),
            new_product("SKU-1", 0, 1),
            new_product("SKU-1", 100, -1),
        ] {
            let err = catalog.create_product(bad).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }

        let created = catalog
            .create_product(new_product(" SKU-1 ", 100, 0))
            .await
            .unwrap();
        assert_eq!(created.sku, "SKU-1");
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_a_conflict() {
        let catalog = CatalogService::new(InMemoryOrderStore::new());
        catalog
            .create_product(new_product("SKU-1", 100, 1))
            .await
            .unwrap();

        let err = catalog
            .create_product(new_product("SKU-1", 200, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_update_product() {
        let catalog = CatalogService::new(InMemoryOrderStore::new());
        let product = catalog
            .create_product(new_product("SKU-1", 100, 1))
            .await
            .unwrap();

        let empty = catalog
            .update_product(product.id, ProductPatch::default())
            .await;
        assert!(matches!(empty, Err(DomainError::InvalidProduct(_))));

        let restocked = catalog
            .update_product(
                product.id,
                ProductPatch {
                    price_cents: None,
                    stock: Some(50),
                },
            )
            .await
            .unwrap();
        assert_eq!(restocked.stock, 50);

        let missing = catalog
            .update_product(
                ProductId::new(99),
                ProductPatch {
                    price_cents: Some(10),
                    stock: None,
                },
            )
            .await;
        assert!(matches!(missing, Err(DomainError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_products_sets_next_cursor_on_full_pages() {
        let catalog = CatalogService::new(InMemoryOrderStore::new());
        for i in 1..=3 {
            catalog
                .create_product(new_product(&format!("SKU-{i}"), 100, 1))
                .await
                .unwrap();
        }

        let page = catalog
            .list_products(ProductQuery::new().limit(2))
            .await
            .unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.next_cursor, Some(ProductId::new(2)));

        let last = catalog
            .list_products(ProductQuery::new().after(ProductId::new(2)).limit(2))
            .await
            .unwrap();
        assert_eq!(last.data.len(), 1);
        assert_eq!(last.next_cursor, None);
    }
}

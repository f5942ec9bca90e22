//! Catalog service - product list and product detail

use std::sync::Arc;

use crate::domain::{Fetched, Product};
use crate::ports::StorefrontApi;

pub const MSG_PRODUCTS_FAILED: &str = "Failed to load products";
pub const MSG_PRODUCT_NOT_FOUND: &str = "Product not found";

/// Read-only access to the catalog; failures are not retried
pub struct CatalogService {
    api: Arc<dyn StorefrontApi>,
}

impl CatalogService {
    pub fn new(api: Arc<dyn StorefrontApi>) -> Self {
        Self { api }
    }

    pub fn list_products(&self) -> Fetched<Vec<Product>> {
        match self.api.list_products() {
            Ok(products) => Fetched::Ready(products),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load products");
                Fetched::from_error(&e, MSG_PRODUCTS_FAILED)
            }
        }
    }

    pub fn get_product(&self, product_id: i64) -> Fetched<Product> {
        match self.api.get_product(product_id) {
            Ok(product) => Fetched::Ready(product),
            Err(e) => {
                tracing::warn!(product_id, error = %e, "failed to load product");
                Fetched::from_error(&e, MSG_PRODUCT_NOT_FOUND)
            }
        }
    }
}

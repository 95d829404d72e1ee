use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::domain::order::{Product, ProductId};
use crate::ports::{PortError, ProductCatalog};

#[derive(Debug, Default)]
pub struct InMemoryProductCatalog {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductCatalog {
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: RwLock::new(
                products
                    .into_iter()
                    .map(|product| (product.id.clone(), product))
                    .collect(),
            ),
        }
    }

    pub async fn upsert(&self, product: Product) {
        self.products.write().await.insert(product.id.clone(), product);
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn get_active_by_ids(
        &self,
        ids: &[ProductId],
        cancel: &CancellationToken,
    ) -> Result<Vec<Product>, PortError> {
        if cancel.is_cancelled() {
            return Err(PortError::Cancelled);
        }

        let products = self.products.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| products.get(id))
            .filter(|product| product.is_active)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use testresult::TestResult;

    fn product(id: &str, is_active: bool) -> Product {
        Product {
            id: ProductId::new(id),
            name: id.to_string(),
            price: Decimal::ONE,
            is_active,
        }
    }

    #[tokio::test]
    async fn test_inactive_and_unknown_products_are_omitted() -> TestResult {
        let catalog = InMemoryProductCatalog::new([product("A", true), product("B", false)]);

        let found = catalog
            .get_active_by_ids(
                &[ProductId::new("A"), ProductId::new("B"), ProductId::new("C")],
                &CancellationToken::new(),
            )
            .await?;

        assert_eq!(found, vec![product("A", true)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_reactivates_product() -> TestResult {
        let catalog = InMemoryProductCatalog::new([product("B", false)]);
        catalog.upsert(product("B", true)).await;

        let found = catalog
            .get_active_by_ids(&[ProductId::new("B")], &CancellationToken::new())
            .await?;
        assert_eq!(found.len(), 1);
        Ok(())
    }
}

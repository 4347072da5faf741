use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use super::{NewProduct, ProductChanges, ProductFilter, ProductRepository, RepositoryError};
use crate::domain::Product;

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i64, Product>,
    last_id: i64,
}

/// A process-local product table.
///
/// Ids are assigned sequentially starting at 1, like an autoincrement column.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductRepository {
    table: Arc<RwLock<Table>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let now = Utc::now().naive_utc();
        let row = Product {
            id: table.last_id,
            name: product.name,
            price: product.price,
            available: product.available,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn count(&self, filter: ProductFilter) -> Result<u64, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.rows.values().filter(|p| filter.matches(p)).count() as u64)
    }

    async fn find_many(
        &self,
        filter: ProductFilter,
        skip: u64,
        take: u64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|p| filter.matches(p))
            .skip(skip as usize)
            .take(take as usize)
            .cloned()
            .collect())
    }

    async fn find_unique(&self, filter: ProductFilter) -> Result<Option<Product>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|p| filter.matches(p)).cloned())
    }

    async fn update(
        &self,
        filter: ProductFilter,
        changes: ProductChanges,
    ) -> Result<Option<Product>, RepositoryError> {
        if filter.id.is_none() {
            return Err(RepositoryError::Backend(
                "update requires an id in the filter".to_string(),
            ));
        }
        let mut table = self.table.write().await;
        let Some(row) = table.rows.values_mut().find(|p| filter.matches(p)) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            row.name = name;
        }
        if let Some(price) = changes.price {
            row.price = price;
        }
        if let Some(available) = changes.available {
            row.available = available;
        }
        row.updated_at = Utc::now().naive_utc();
        Ok(Some(row.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price: 9.5,
            available: true,
        }
    }

    #[tokio::test]
    async fn assigns_sequential_ids() {
        let repo = InMemoryProductRepository::new();
        let a = repo.create(widget("a")).await.unwrap();
        let b = repo.create(widget("b")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
    }

    #[tokio::test]
    async fn conditional_update_skips_inactive_rows() {
        let repo = InMemoryProductRepository::new();
        let p = repo.create(widget("a")).await.unwrap();

        let removed = repo
            .update(ProductFilter::active_id(p.id), ProductChanges::soft_delete())
            .await
            .unwrap();
        assert_eq!(removed.map(|p| p.available), Some(false));

        let again = repo
            .update(ProductFilter::active_id(p.id), ProductChanges::soft_delete())
            .await
            .unwrap();
        assert!(again.is_none());
        assert_eq!(repo.count(ProductFilter::active()).await.unwrap(), 0);
        assert_eq!(repo.count(ProductFilter::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_without_id_is_rejected() {
        let repo = InMemoryProductRepository::new();
        repo.create(widget("a")).await.unwrap();
        repo.create(widget("b")).await.unwrap();

        let err = repo
            .update(ProductFilter::active(), ProductChanges::soft_delete())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Backend(_)));
        assert_eq!(repo.count(ProductFilter::active()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn find_many_windows_in_id_order() {
        let repo = InMemoryProductRepository::new();
        for i in 0..5 {
            repo.create(widget(&format!("p{i}"))).await.unwrap();
        }
        let page = repo.find_many(ProductFilter::active(), 2, 2).await.unwrap();
        let ids: Vec<_> = page.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 4]);
    }
}

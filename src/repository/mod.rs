//! Data-access seam for the `product` table.
//!
//! The catalog only ever talks to a [`ProductRepository`]; the concrete store
//! is chosen at startup and injected.

#[cfg(test)]
mod memory;
mod sqlite;

#[cfg(test)]
pub use memory::InMemoryProductRepository;
pub use sqlite::SqliteProductRepository;

use std::future::Future;
use thiserror::Error;

use crate::domain::Product;

/// Errors raised by a product store.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Store error: {0}")]
    Backend(String),
}

/// Row filter. `None` fields do not constrain the match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub id: Option<i64>,
    pub available: Option<bool>,
}

impl ProductFilter {
    /// Matches every record still visible to the catalog.
    pub fn active() -> Self {
        Self {
            id: None,
            available: Some(true),
        }
    }

    /// Matches the active record with the given id, if any.
    pub fn active_id(id: i64) -> Self {
        Self {
            id: Some(id),
            available: Some(true),
        }
    }

    #[cfg(test)]
    pub fn matches(&self, product: &Product) -> bool {
        self.id.map_or(true, |id| product.id == id)
            && self.available.map_or(true, |a| product.available == a)
    }
}

/// Fields of a new record. The store assigns `id` and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub available: bool,
}

/// Partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub available: Option<bool>,
}

impl ProductChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.available.is_none()
    }

    pub fn soft_delete() -> Self {
        Self {
            available: Some(false),
            ..Self::default()
        }
    }
}

/// Narrow capability set over the `product` table.
pub trait ProductRepository: Send + Sync + 'static {
    fn create(
        &self,
        product: NewProduct,
    ) -> impl Future<Output = Result<Product, RepositoryError>> + Send;

    fn count(&self, filter: ProductFilter)
        -> impl Future<Output = Result<u64, RepositoryError>> + Send;

    /// Returns matching records ordered by id.
    fn find_many(
        &self,
        filter: ProductFilter,
        skip: u64,
        take: u64,
    ) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send;

    fn find_unique(
        &self,
        filter: ProductFilter,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// Applies `changes` to the single record matching `filter`.
    ///
    /// The filter is evaluated and the write applied as one step; `Ok(None)`
    /// means nothing matched and nothing was written.
    fn update(
        &self,
        filter: ProductFilter,
        changes: ProductChanges,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;
}

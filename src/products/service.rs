use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use super::{CreateProductDto, PaginationDto, ProductError, UpdateProductDto};
use crate::domain::{PageMetadata, Paginated, Product};
use crate::repository::{ProductChanges, ProductFilter, ProductRepository};

/// What listing page 1 of an empty catalog does.
///
/// With no active products `last_page` is 0, so page 1 lies past the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyPagePolicy {
    /// Fail like any other out-of-range page.
    #[default]
    Reject,
    /// Return an empty first page.
    EmptyPage,
}

/// Catalog business rules over an injected product store.
#[derive(Debug, Clone)]
pub struct ProductsService<R> {
    repository: R,
    empty_page: EmptyPagePolicy,
}

impl<R: ProductRepository> ProductsService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            empty_page: EmptyPagePolicy::default(),
        }
    }

    pub fn with_empty_page_policy(mut self, policy: EmptyPagePolicy) -> Self {
        self.empty_page = policy;
        self
    }

    #[instrument(skip(self, dto), fields(product_name = %dto.name))]
    pub async fn create(&self, dto: CreateProductDto) -> Result<Product, ProductError> {
        dto.validate()?;
        match self.repository.create(dto.into_new_product()).await {
            Ok(product) => {
                info!(product_id = product.id, "Product created");
                Ok(product)
            }
            Err(e) => {
                error!(error = %e, error_debug = ?e, "Failed to create product");
                Err(ProductError::CreationFailed)
            }
        }
    }

    #[instrument(skip(self), fields(page = pagination.page(), limit = pagination.limit()))]
    pub async fn find_all(&self, pagination: PaginationDto) -> Result<Paginated<Product>, ProductError> {
        pagination.validate()?;
        let (page, limit) = (pagination.page(), pagination.limit());

        let total = self.repository.count(ProductFilter::active()).await?;
        let metadata = PageMetadata::new(page, total, limit);

        if page > metadata.last_page {
            let empty_first_page = total == 0 && page == 1;
            if !(empty_first_page && self.empty_page == EmptyPagePolicy::EmptyPage) {
                debug!(last_page = metadata.last_page, "Requested page is out of range");
                return Err(ProductError::validation(
                    "Page number exceeds total pages available",
                ));
            }
        }

        let data = self
            .repository
            .find_many(ProductFilter::active(), pagination.offset(), limit)
            .await?;
        debug!(returned = data.len(), total, "Listed products");
        Ok(Paginated { data, metadata })
    }

    #[instrument(skip(self))]
    pub async fn find_one(&self, id: i64) -> Result<Product, ProductError> {
        self.repository
            .find_unique(ProductFilter::active_id(id))
            .await?
            .ok_or(ProductError::NotFound { id })
    }

    /// Existence check and write happen in one conditional update, so a
    /// concurrent remove can't slip in between.
    #[instrument(skip(self, dto))]
    pub async fn update(&self, id: i64, dto: UpdateProductDto) -> Result<Product, ProductError> {
        if let Some(body_id) = dto.id.filter(|body_id| *body_id != id) {
            debug!(body_id, "Ignoring id carried in update payload");
        }
        dto.validate()?;
        let changes = dto.into_changes();
        if changes.is_empty() {
            return self.find_one(id).await;
        }

        let product = self
            .repository
            .update(ProductFilter::active_id(id), changes)
            .await?
            .ok_or(ProductError::NotFound { id })?;
        info!("Product updated");
        Ok(product)
    }

    /// Soft delete: flips `available` off and returns the final record.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: i64) -> Result<Product, ProductError> {
        let product = self
            .repository
            .update(ProductFilter::active_id(id), ProductChanges::soft_delete())
            .await?
            .ok_or(ProductError::NotFound { id })?;
        info!("Product marked unavailable");
        Ok(product)
    }
}

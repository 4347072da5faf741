use serde::{Deserialize, Serialize};

use super::ProductError;
use crate::repository::{NewProduct, ProductChanges};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

fn check_name(name: &str) -> Result<(), ProductError> {
    if name.trim().is_empty() {
        return Err(ProductError::validation("name must not be empty"));
    }
    Ok(())
}

fn check_price(price: f64) -> Result<(), ProductError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ProductError::validation(format!(
            "price must be a non-negative number, got {price}"
        )));
    }
    Ok(())
}

/// Payload for creating a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProductDto {
    pub name: String,
    pub price: f64,
}

impl CreateProductDto {
    pub fn validate(&self) -> Result<(), ProductError> {
        check_name(&self.name)?;
        check_price(self.price)
    }

    /// New records always start out available.
    pub fn into_new_product(self) -> NewProduct {
        NewProduct {
            name: self.name.trim().to_string(),
            price: self.price,
            available: true,
        }
    }
}

/// Partial update payload.
///
/// Callers commonly echo the id back in the body; it is accepted and ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateProductDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl UpdateProductDto {
    pub fn validate(&self) -> Result<(), ProductError> {
        if let Some(name) = &self.name {
            check_name(name)?;
        }
        if let Some(price) = self.price {
            check_price(price)?;
        }
        Ok(())
    }

    /// Drops `id` and keeps the remaining fields as a partial update.
    pub fn into_changes(self) -> ProductChanges {
        ProductChanges {
            name: self.name.map(|n| n.trim().to_string()),
            price: self.price,
            available: None,
        }
    }
}

/// `page` and `limit` are both 1-based and optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl PaginationDto {
    #[cfg(test)]
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    pub fn page(&self) -> u64 {
        self.page.unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    pub fn offset(&self) -> u64 {
        self.page().saturating_sub(1).saturating_mul(self.limit())
    }

    pub fn validate(&self) -> Result<(), ProductError> {
        if self.page() < 1 {
            return Err(ProductError::validation("page must be a positive number"));
        }
        if self.limit() < 1 {
            return Err(ProductError::validation("limit must be a positive number"));
        }
        Ok(())
    }
}

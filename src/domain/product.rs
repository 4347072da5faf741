use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A catalog entry as persisted in the `product` table.
///
/// `available` doubles as the soft-delete marker: once it flips to `false`
/// the record is invisible to every lookup the catalog performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub available: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Position of a result window within the full filtered set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub page: u64,
    pub total: u64,
    pub last_page: u64,
}

/// A page of results with pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub metadata: PageMetadata,
}

impl PageMetadata {
    /// Computes `last_page = ceil(total / limit)`.
    ///
    /// `limit` is validated to be at least 1 before it gets here.
    pub fn new(page: u64, total: u64, limit: u64) -> Self {
        let last_page = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            page,
            total,
            last_page,
        }
    }
}

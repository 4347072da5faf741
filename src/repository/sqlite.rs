use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use tracing::{debug, info, instrument};

use super::{NewProduct, ProductChanges, ProductFilter, ProductRepository, RepositoryError};
use crate::domain::Product;

const COLUMNS: &str = "id, name, price, available, created_at, updated_at";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS product (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    price REAL NOT NULL,
    available BOOLEAN NOT NULL DEFAULT 1,
    created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

/// `product` table backed by an sqlx SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteProductRepository {
    pool: SqlitePool,
}

impl SqliteProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens the pool and makes sure the `product` table exists.
    ///
    /// In-memory databases live and die with their connection, so those get a
    /// single connection that is never recycled.
    #[instrument(skip_all)]
    pub async fn connect(database_url: &str) -> Result<Self, RepositoryError> {
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(connect_options).await?;
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        info!(in_memory, "Connected to the database");
        Ok(Self::new(pool))
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: ProductFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(id) = filter.id {
        qb.push(" AND id = ").push_bind(id);
    }
    if let Some(available) = filter.available {
        qb.push(" AND available = ").push_bind(available);
    }
}

impl ProductRepository for SqliteProductRepository {
    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let now = Utc::now().naive_utc();
        let row = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO product (name, price, available, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING {COLUMNS}"
        ))
        .bind(product.name)
        .bind(product.price)
        .bind(product.available)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        debug!(product_id = row.id, "Inserted product row");
        Ok(row)
    }

    async fn count(&self, filter: ProductFilter) -> Result<u64, RepositoryError> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM product");
        push_filter(&mut qb, filter);
        let (total,) = qb.build_query_as::<(i64,)>().fetch_one(&self.pool).await?;
        Ok(total.max(0) as u64)
    }

    async fn find_many(
        &self,
        filter: ProductFilter,
        skip: u64,
        take: u64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM product"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY id ASC LIMIT ")
            .push_bind(take as i64)
            .push(" OFFSET ")
            .push_bind(skip as i64);
        Ok(qb.build_query_as::<Product>().fetch_all(&self.pool).await?)
    }

    async fn find_unique(&self, filter: ProductFilter) -> Result<Option<Product>, RepositoryError> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM product"));
        push_filter(&mut qb, filter);
        qb.push(" LIMIT 1");
        Ok(qb.build_query_as::<Product>().fetch_optional(&self.pool).await?)
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
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE product SET updated_at = ");
        qb.push_bind(Utc::now().naive_utc());
        if let Some(name) = changes.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(price) = changes.price {
            qb.push(", price = ").push_bind(price);
        }
        if let Some(available) = changes.available {
            qb.push(", available = ").push_bind(available);
        }
        push_filter(&mut qb, filter);
        qb.push(format!(" RETURNING {COLUMNS}"));
        Ok(qb.build_query_as::<Product>().fetch_optional(&self.pool).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo() -> SqliteProductRepository {
        SqliteProductRepository::connect("sqlite::memory:").await.unwrap()
    }

    fn new_product(name: &str, price: f64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price,
            available: true,
        }
    }

    #[tokio::test]
    async fn insert_returns_assigned_row() {
        let repo = repo().await;
        let p = repo.create(new_product("Keyboard", 149.99)).await.unwrap();
        assert_eq!(p.id, 1);
        assert_eq!(p.name, "Keyboard");
        assert!(p.available);

        let fetched = repo.find_unique(ProductFilter::active_id(p.id)).await.unwrap();
        assert_eq!(fetched.map(|f| f.id), Some(p.id));
    }

    #[tokio::test]
    async fn count_and_window_respect_availability() {
        let repo = repo().await;
        for i in 1..=6 {
            repo.create(new_product(&format!("p{i}"), i as f64)).await.unwrap();
        }
        repo.update(ProductFilter::active_id(2), ProductChanges::soft_delete())
            .await
            .unwrap();

        assert_eq!(repo.count(ProductFilter::active()).await.unwrap(), 5);
        let window = repo.find_many(ProductFilter::active(), 1, 2).await.unwrap();
        let ids: Vec<_> = window.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[tokio::test]
    async fn update_with_no_match_writes_nothing() {
        let repo = repo().await;
        let p = repo.create(new_product("Stand", 79.99)).await.unwrap();
        repo.update(ProductFilter::active_id(p.id), ProductChanges::soft_delete())
            .await
            .unwrap();

        let changes = ProductChanges {
            name: Some("Renamed".to_string()),
            ..ProductChanges::default()
        };
        let result = repo.update(ProductFilter::active_id(p.id), changes).await.unwrap();
        assert!(result.is_none());

        let row = repo
            .find_unique(ProductFilter { id: Some(p.id), available: None })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.name, "Stand");
        assert!(!row.available);
    }

    #[tokio::test]
    async fn file_database_survives_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("catalog.db").display());

        let first = SqliteProductRepository::connect(&url).await.unwrap();
        first.create(new_product("Lamp", 25.0)).await.unwrap();
        first.pool.close().await;

        let second = SqliteProductRepository::connect(&url).await.unwrap();
        assert_eq!(second.count(ProductFilter::active()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_without_id_is_rejected() {
        let repo = repo().await;
        let err = repo
            .update(ProductFilter::active(), ProductChanges::soft_delete())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Backend(_)));
    }
}

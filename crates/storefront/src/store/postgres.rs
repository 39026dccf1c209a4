//! Direct `PostgreSQL` adapter for the catalog and order stores.
//!
//! # Schema
//!
//! Migrations live in `crates/storefront/migrations/` and are run via:
//! ```bash
//! cargo run -p thread-hanger-cli -- migrate
//! ```
//!
//! `orders.product_id` references `products` with `ON DELETE RESTRICT`, so a
//! product with orders cannot be deleted until those orders are.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::instrument;

use thread_hanger_core::{
    Category, NewOrder, NewProduct, Order, OrderId, OrderStatus, Price, Product, ProductId, Size,
    SizeSet,
};

use super::{CatalogStore, OrderStore, StoreError};

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `StoreError::Database` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await?;
    Ok(pool)
}

/// Catalog and order store backed by a `PgPool`.
#[derive(Debug, Clone)]
pub struct PgBackend {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    product_id: i64,
    name: String,
    price: i64,
    category: String,
    sizes: Vec<String>,
    image_url: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let id = row.product_id;
        let corrupt = move |what: String| StoreError::DataCorruption(format!("product {id}: {what}"));
        let price = Price::try_from(row.price).map_err(|e| corrupt(e.to_string()))?;
        let category = row.category.parse::<Category>().map_err(corrupt)?;
        let sizes = row
            .sizes
            .iter()
            .map(|s| s.parse::<Size>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(corrupt)?;
        let sizes = SizeSet::new(sizes).map_err(|e| corrupt(e.to_string()))?;

        Ok(Self {
            product_id: ProductId::new(row.product_id),
            name: row.name,
            price,
            category,
            sizes,
            image_url: row.image_url,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    product_id: i64,
    customer_name: String,
    phone: String,
    address: String,
    size: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::DataCorruption(format!("order {}: {e}", row.id)))?;

        Ok(Self {
            id: OrderId::new(row.id),
            product_id: ProductId::new(row.product_id),
            customer_name: row.customer_name,
            phone: row.phone,
            address: row.address,
            size: row.size,
            status,
            created_at: row.created_at,
        })
    }
}

const PRODUCT_COLUMNS: &str = "product_id, name, price, category, sizes, image_url";
const ORDER_COLUMNS: &str =
    "id, product_id, customer_name, phone, address, size, status, created_at";

/// Map constraint violations to the variants callers can explain.
fn map_db_error(err: sqlx::Error, context: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_foreign_key_violation()
    {
        return StoreError::Conflict(format!("{context}: {}", db_err.message()));
    }
    StoreError::Database(err)
}

impl PgBackend {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for PgBackend {
    #[instrument(skip(self))]
    async fn list_products(&self, category: Option<Category>) -> Result<Vec<Product>, StoreError> {
        let rows = match category {
            Some(category) => {
                sqlx::query_as::<_, ProductRow>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE category = $1 ORDER BY product_id"
                ))
                .bind(category.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ProductRow>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY product_id"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(Product::try_from).collect()
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let sizes: Vec<String> = product.sizes.iter().map(|s| s.as_str().to_owned()).collect();
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products (name, price, category, sizes, image_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&product.name)
        .bind(i64::from(product.price))
        .bind(product.category.as_str())
        .bind(&sizes)
        .bind(&product.image_url)
        .fetch_one(&self.pool)
        .await?;

        Product::try_from(row)
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "product is referenced by existing orders"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("product {id}")));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgBackend {
    #[instrument(skip(self))]
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Inserts every row inside one transaction; any failure rolls back the batch.
    #[instrument(skip(self, orders), fields(count = orders.len()))]
    async fn insert_orders(&self, orders: Vec<NewOrder>) -> Result<Vec<Order>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(orders.len());

        for order in orders {
            let row = sqlx::query_as::<_, OrderRow>(&format!(
                "INSERT INTO orders (product_id, customer_name, phone, address, size, status) \
                 VALUES ($1, $2, $3, $4, $5, $6) RETURNING {ORDER_COLUMNS}"
            ))
            .bind(order.product_id)
            .bind(&order.customer_name)
            .bind(&order.phone)
            .bind(&order.address)
            .bind(&order.size)
            .bind(order.status.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_db_error(e, "ordered product no longer exists"))?;

            inserted.push(Order::try_from(row)?);
        }

        tx.commit().await?;
        Ok(inserted)
    }

    #[instrument(skip(self))]
    async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, StoreError> {
        // A verified order never goes back to pending.
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET status = $2 \
             WHERE id = $1 AND NOT (status = 'verified' AND $2 = 'pending') \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Order::try_from(row);
        }

        let current: Option<String> = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match current {
            Some(current) => Err(StoreError::Conflict(format!(
                "order {id} is {current} and cannot become {status}"
            ))),
            None => Err(StoreError::NotFound(format!("order {id}"))),
        }
    }

    #[instrument(skip(self))]
    async fn delete_order(&self, id: OrderId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("order {id}")));
        }
        Ok(())
    }
}

//! Ports for the external catalog, order, and asset stores.
//!
//! The boutique keeps no state of its own: every product, order, and image
//! lives in an external store reached through one of these traits. Each
//! operation is a single round-trip with no retry.
//!
//! # Adapters
//!
//! - [`RestBackend`] - hosted Postgres behind a PostgREST-style API plus object storage
//! - [`PgBackend`] - direct `PostgreSQL` via sqlx (images go to [`LocalAssetStore`])
//! - [`InMemoryBackend`] - process-local, for development and tests

mod local_assets;
mod memory;
mod postgres;
mod rest;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use thread_hanger_core::{
    Category, NewOrder, NewProduct, Order, OrderId, OrderStatus, Product, ProductId,
};

use crate::config::{BackendConfig, StorefrontConfig};

pub use local_assets::LocalAssetStore;
pub use memory::{InMemoryBackend, StoredObject};
pub use postgres::{PgBackend, create_pool};
pub use rest::RestBackend;

/// Errors returned by store adapters.
///
/// The `Display` text is what the visitor or admin sees after `Error: `, so
/// variants carry the store's own message where it has one.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport failure talking to a hosted store.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// The hosted store answered with an error body.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A row did not match the expected shape.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// No row matched the given key.
    #[error("{0} not found")]
    NotFound(String),

    /// A constraint refused the write (e.g. product still referenced by orders).
    #[error("{0}")]
    Conflict(String),

    /// Local file storage failed.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    /// The store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Product rows, queried by category.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// List products, optionally restricted to one category by exact match.
    async fn list_products(&self, category: Option<Category>) -> Result<Vec<Product>, StoreError>;

    /// Insert one product row and return it with its assigned id.
    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError>;

    /// Delete one product row by primary key.
    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError>;

    /// Cheap round-trip used by the readiness probe.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Order rows, mutated by status and id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Every order, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError>;

    /// Insert all rows as one atomic batch.
    async fn insert_orders(&self, orders: Vec<NewOrder>) -> Result<Vec<Order>, StoreError>;

    /// Set one order's status.
    async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, StoreError>;

    /// Delete one order row by primary key.
    async fn delete_order(&self, id: OrderId) -> Result<(), StoreError>;
}

/// Binary object storage for product images.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store a blob under `name` and return its public URL.
    async fn upload(
        &self,
        name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StoreError>;

    /// Stable public URL for an object name.
    fn public_url(&self, name: &str) -> String;
}

/// The set of store handles the application runs against.
#[derive(Clone)]
pub struct Backends {
    pub catalog: Arc<dyn CatalogStore>,
    pub orders: Arc<dyn OrderStore>,
    pub assets: Arc<dyn AssetStore>,
    /// Present for the postgres backend; sessions are stored there too.
    pub pool: Option<PgPool>,
    /// Directory served at `/uploads` when images are stored locally.
    pub upload_dir: Option<PathBuf>,
}

impl Backends {
    /// Connect the adapters selected by configuration.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the HTTP client cannot be built or the
    /// database cannot be reached.
    pub async fn connect(config: &StorefrontConfig) -> Result<Self, StoreError> {
        let uploads_base = format!("{}/uploads", config.base_url.trim_end_matches('/'));

        match &config.backend {
            BackendConfig::Rest(rest) => {
                let backend = Arc::new(RestBackend::new(rest)?);
                tracing::info!(url = %rest.url, bucket = %rest.bucket, "Using hosted store");
                Ok(Self {
                    catalog: backend.clone(),
                    orders: backend.clone(),
                    assets: backend,
                    pool: None,
                    upload_dir: None,
                })
            }
            BackendConfig::Postgres {
                database_url,
                upload_dir,
            } => {
                let pool = create_pool(database_url).await?;
                let backend = Arc::new(PgBackend::new(pool.clone()));
                tracing::info!(upload_dir = %upload_dir.display(), "Using postgres store");
                Ok(Self {
                    catalog: backend.clone(),
                    orders: backend,
                    assets: Arc::new(LocalAssetStore::new(upload_dir.clone(), uploads_base)),
                    pool: Some(pool),
                    upload_dir: Some(upload_dir.clone()),
                })
            }
            BackendConfig::Memory { upload_dir } => {
                tracing::warn!("Using in-memory store; data is lost on restart");
                let backend = Arc::new(InMemoryBackend::new(uploads_base.clone()));
                Ok(Self {
                    catalog: backend.clone(),
                    orders: backend,
                    assets: Arc::new(LocalAssetStore::new(upload_dir.clone(), uploads_base)),
                    pool: None,
                    upload_dir: Some(upload_dir.clone()),
                })
            }
        }
    }

    /// Run every port against one in-memory backend.
    #[must_use]
    pub fn in_memory(backend: InMemoryBackend) -> Self {
        let backend = Arc::new(backend);
        Self {
            catalog: backend.clone(),
            orders: backend.clone(),
            assets: backend,
            pool: None,
            upload_dir: None,
        }
    }
}

/// Object name for an uploaded image: `<millis>_<sanitized filename>`.
///
/// Anything other than ASCII alphanumerics, `.`, `-` and `_` becomes `_`, so
/// the name is safe both as a URL path segment and as a local file name.
#[must_use]
pub fn object_name(now_ms: i64, filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();
    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = sanitized.trim_start_matches('.');
    if sanitized.is_empty() {
        format!("{now_ms}_image")
    } else {
        format!("{now_ms}_{sanitized}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_name_prefixes_millis() {
        assert_eq!(object_name(1_700_000_000_000, "kurta.jpg"), "1700000000000_kurta.jpg");
    }

    #[test]
    fn test_object_name_sanitizes() {
        assert_eq!(object_name(5, "summer lawn (1).png"), "5_summer_lawn__1_.png");
        assert_eq!(object_name(5, "../../etc/passwd"), "5_passwd");
        assert_eq!(object_name(5, "C:\\photos\\shawl.webp"), "5_shawl.webp");
        assert_eq!(object_name(5, ".."), "5_image");
        assert_eq!(object_name(5, ""), "5_image");
    }
}

//! Hosted store adapter: PostgREST tables plus object storage.
//!
//! Tables live under `/rest/v1/{table}` and images under
//! `/storage/v1/object/{bucket}/{name}`. Every request carries the service
//! key both as `apikey` and as a bearer token.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use thread_hanger_core::{
    Category, NewOrder, NewProduct, Order, OrderId, OrderStatus, Product, ProductId,
};

use super::{AssetStore, CatalogStore, OrderStore, StoreError};
use crate::config::RestStoreConfig;

const PRODUCTS: &str = "products";
const ORDERS: &str = "orders";

/// Postgres error code for a foreign key violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Client for the hosted catalog, order, and asset store.
#[derive(Clone)]
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    service_key: SecretString,
    bucket: String,
}

impl std::fmt::Debug for RestBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestBackend")
            .field("base_url", &self.base_url)
            .field("service_key", &"[REDACTED]")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

/// Error body shared by the table and storage APIs.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl RestBackend {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Http` if the HTTP client cannot be constructed.
    pub fn new(config: &RestStoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("thread-hanger/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.as_str().trim_end_matches('/').to_owned(),
            service_key: config.service_key.clone(),
            bucket: config.bucket.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn object_url(&self, name: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            urlencoding::encode(name)
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let key = self.service_key.expose_secret();
        self.client
            .request(method, url)
            .header("apikey", key)
            .bearer_auth(key)
    }

    /// Turn a non-success response into a `StoreError` carrying the store's message.
    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body: Option<ErrorBody> = serde_json::from_str(&text).ok();
        let (code, message) = match body {
            Some(body) => (body.code, body.message.or(body.error)),
            None => (None, None),
        };
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("store returned {status}"));

        tracing::warn!(status = status.as_u16(), code = ?code, %message, "Store rejected request");

        if code.as_deref() == Some(FOREIGN_KEY_VIOLATION) {
            return Err(StoreError::Conflict(message));
        }
        Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, StoreError> {
        let response = Self::check(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    /// Delete rows matching `column = id`, failing if nothing matched.
    async fn delete_by(&self, table: &str, column: &str, id: i64) -> Result<(), StoreError> {
        let request = self
            .request(Method::DELETE, &self.table_url(table))
            .query(&[(column, format!("eq.{id}"))])
            .header("Prefer", "return=representation");

        let deleted: Vec<serde_json::Value> = Self::send_json(request).await?;
        if deleted.is_empty() {
            return Err(StoreError::NotFound(format!("{} {id}", table.trim_end_matches('s'))));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for RestBackend {
    #[instrument(skip(self))]
    async fn list_products(&self, category: Option<Category>) -> Result<Vec<Product>, StoreError> {
        let mut query = vec![("select", "*".to_owned())];
        if let Some(category) = category {
            query.push(("category", format!("eq.{}", category.as_str())));
        }
        let request = self
            .request(Method::GET, &self.table_url(PRODUCTS))
            .query(&query);
        Self::send_json(request).await
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let request = self
            .request(Method::POST, &self.table_url(PRODUCTS))
            .header("Prefer", "return=representation")
            .json(&[product]);

        let rows: Vec<Product> = Self::send_json(request).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::DataCorruption("insert returned no product row".to_owned()))
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        self.delete_by(PRODUCTS, "product_id", id.as_i64()).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let request = self
            .request(Method::GET, &self.table_url(PRODUCTS))
            .query(&[("select", "product_id"), ("limit", "1")]);
        let _: Vec<serde_json::Value> = Self::send_json(request).await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for RestBackend {
    #[instrument(skip(self))]
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let request = self
            .request(Method::GET, &self.table_url(ORDERS))
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        Self::send_json(request).await
    }

    /// One POST with a JSON array, which the store applies as a single statement.
    #[instrument(skip(self, orders), fields(count = orders.len()))]
    async fn insert_orders(&self, orders: Vec<NewOrder>) -> Result<Vec<Order>, StoreError> {
        let request = self
            .request(Method::POST, &self.table_url(ORDERS))
            .header("Prefer", "return=representation")
            .json(&orders);
        Self::send_json(request).await
    }

    #[instrument(skip(self))]
    async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, StoreError> {
        let request = self
            .request(Method::PATCH, &self.table_url(ORDERS))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "status": status }));

        let rows: Vec<Order> = Self::send_json(request).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))
    }

    #[instrument(skip(self))]
    async fn delete_order(&self, id: OrderId) -> Result<(), StoreError> {
        self.delete_by(ORDERS, "id", id.as_i64()).await
    }
}

#[async_trait]
impl AssetStore for RestBackend {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StoreError> {
        let request = self
            .request(Method::POST, &self.object_url(name))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes);
        Self::check(request.send().await?).await?;
        Ok(self.public_url(name))
    }

    fn public_url(&self, name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            urlencoding::encode(name)
        )
    }
}

//! Process-local store used for development and tests.
//!
//! Enforces the same referential rule as the `PostgreSQL` schema: orders must
//! reference an existing product, and a product with orders cannot be
//! deleted.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use thread_hanger_core::{
    Category, NewOrder, NewProduct, Order, OrderId, OrderStatus, Product, ProductId,
};

use super::{AssetStore, CatalogStore, OrderStore, StoreError};

#[derive(Default)]
struct State {
    products: Vec<Product>,
    orders: Vec<Order>,
    objects: HashMap<String, StoredObject>,
    next_product_id: i64,
    next_order_id: i64,
}

/// A blob held by the in-memory asset store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// In-memory catalog, order, and asset store.
///
/// Clones share the same data, so a test can keep a handle while the
/// application owns another.
#[derive(Clone)]
pub struct InMemoryBackend {
    state: Arc<RwLock<State>>,
    unavailable: Arc<AtomicBool>,
    public_base: String,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new(public_base: impl Into<String>) -> Self {
        Self {
            state: Arc::new(RwLock::new(State {
                next_product_id: 1,
                next_order_id: 1,
                ..State::default()
            })),
            unavailable: Arc::new(AtomicBool::new(false)),
            public_base: public_base.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of all product rows.
    pub async fn products(&self) -> Vec<Product> {
        self.state.read().await.products.clone()
    }

    /// Snapshot of all order rows in insertion order.
    pub async fn orders(&self) -> Vec<Order> {
        self.state.read().await.orders.clone()
    }

    /// Stored blob by object name.
    pub async fn object(&self, name: &str) -> Option<StoredObject> {
        self.state.read().await.objects.get(name).cloned()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store is offline".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for InMemoryBackend {
    async fn list_products(&self, category: Option<Category>) -> Result<Vec<Product>, StoreError> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .products
            .iter()
            .filter(|p| category.is_none_or(|c| p.category == c))
            .cloned()
            .collect())
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let id = ProductId::new(state.next_product_id);
        state.next_product_id += 1;
        let product = product.into_product(id);
        state.products.push(product.clone());
        Ok(product)
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        self.check_available()?;
        let mut state = self.state.write().await;
        if state.orders.iter().any(|o| o.product_id == id) {
            return Err(StoreError::Conflict(format!(
                "product {id} is referenced by existing orders"
            )));
        }
        let before = state.products.len();
        state.products.retain(|p| p.product_id != id);
        if state.products.len() == before {
            return Err(StoreError::NotFound(format!("product {id}")));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

#[async_trait]
impl OrderStore for InMemoryBackend {
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        self.check_available()?;
        let state = self.state.read().await;
        let mut orders = state.orders.clone();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    /// Validates the whole batch before appending any row.
    async fn insert_orders(&self, orders: Vec<NewOrder>) -> Result<Vec<Order>, StoreError> {
        self.check_available()?;
        let mut state = self.state.write().await;

        if let Some(missing) = orders
            .iter()
            .find(|o| !state.products.iter().any(|p| p.product_id == o.product_id))
        {
            return Err(StoreError::Conflict(format!(
                "product {} does not exist",
                missing.product_id
            )));
        }

        let created_at = Utc::now();
        let mut inserted = Vec::with_capacity(orders.len());
        for order in orders {
            let id = OrderId::new(state.next_order_id);
            state.next_order_id += 1;
            inserted.push(Order {
                id,
                product_id: order.product_id,
                customer_name: order.customer_name,
                phone: order.phone,
                address: order.address,
                size: order.size,
                status: order.status,
                created_at,
            });
        }
        state.orders.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, StoreError> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))?;
        if !order.status.can_transition_to(status) {
            return Err(StoreError::Conflict(format!(
                "order {id} is {} and cannot become {status}",
                order.status
            )));
        }
        order.status = status;
        Ok(order.clone())
    }

    async fn delete_order(&self, id: OrderId) -> Result<(), StoreError> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let before = state.orders.len();
        state.orders.retain(|o| o.id != id);
        if state.orders.len() == before {
            return Err(StoreError::NotFound(format!("order {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl AssetStore for InMemoryBackend {
    async fn upload(
        &self,
        name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StoreError> {
        self.check_available()?;
        let mut state = self.state.write().await;
        if state.objects.contains_key(name) {
            return Err(StoreError::Conflict(format!("object {name} already exists")));
        }
        state.objects.insert(
            name.to_owned(),
            StoredObject {
                content_type: content_type.to_owned(),
                bytes,
            },
        );
        Ok(self.public_url(name))
    }

    fn public_url(&self, name: &str) -> String {
        format!("{}/{}", self.public_base, urlencoding::encode(name))
    }
}

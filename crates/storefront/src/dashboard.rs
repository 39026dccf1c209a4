//! Admin dashboard operations over the catalog, order, and asset stores.
//!
//! Every mutation is a single store call followed by a full reload; there is
//! no local state to reconcile.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use thread_hanger_core::{
    Category, FormError, NewProduct, Order, OrderId, OrderStatus, Price, PriceError, Product,
    ProductId, Size, SizeSet,
};

use crate::store::{AssetStore, CatalogStore, OrderStore, StoreError, object_name};

/// Message shown after a product is created.
pub const SYNCED: &str = "Synced to Boutique!";

/// Confirmation prompt before deleting a product.
pub const CONFIRM_DELETE_PRODUCT: &str = "Delete this product permanently?";

/// Confirmation prompt before deleting an order.
pub const CONFIRM_DELETE_ORDER: &str = "Delete this order record permanently?";

/// Errors from dashboard operations.
///
/// The precondition variants render as the exact message the admin sees.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Select an image!")]
    MissingImage,

    #[error("Select at least one size!")]
    NoSizes,

    #[error("Price must be a whole number")]
    InvalidPrice(#[source] PriceError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Everything the dashboard page shows.
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    pub products: Vec<Product>,
    /// Newest first.
    pub orders: Vec<Order>,
}

impl DashboardSnapshot {
    #[must_use]
    pub fn inventory_count(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.orders.iter().filter(|o| o.is_pending()).count()
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.orders
            .iter()
            .filter(|o| o.status == OrderStatus::Verified)
            .count()
    }

    /// Products of one category, in store order.
    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(move |p| p.category == category)
    }

    /// Product name for an order row, if the product still exists.
    #[must_use]
    pub fn product_name(&self, product_id: ProductId) -> Option<&str> {
        self.products
            .iter()
            .find(|p| p.product_id == product_id)
            .map(|p| p.name.as_str())
    }
}

/// Fields of the "add product" form apart from the image.
#[derive(Debug, Clone)]
pub struct ProductForm {
    pub name: String,
    /// As typed; parsed during validation.
    pub price: String,
    pub category: Category,
    pub sizes: Vec<Size>,
}

/// An image chosen in the "add product" form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Answer to a delete confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confirmation {
    Yes,
    No,
}

/// What a delete request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Declined,
}

/// Admin operations. Callers are responsible for the session gate.
#[derive(Clone)]
pub struct AdminDashboard {
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
    assets: Arc<dyn AssetStore>,
}

impl AdminDashboard {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        orders: Arc<dyn OrderStore>,
        assets: Arc<dyn AssetStore>,
    ) -> Self {
        Self {
            catalog,
            orders,
            assets,
        }
    }

    /// Fetch every product and every order concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first `StoreError` if either listing fails.
    #[instrument(skip(self))]
    pub async fn load_all(&self) -> Result<DashboardSnapshot, StoreError> {
        let (products, orders) =
            tokio::join!(self.catalog.list_products(None), self.orders.list_orders());
        Ok(DashboardSnapshot {
            products: products?,
            orders: orders?,
        })
    }

    /// Validate the form, upload the image, then insert the product row.
    ///
    /// Checks run in order: image, sizes, price, name. Nothing is written
    /// unless all pass. If the insert fails after the upload, the image is
    /// left in the asset store.
    ///
    /// # Errors
    ///
    /// Returns the first failed precondition or store error.
    #[instrument(skip(self, form, image), fields(name = %form.name, category = %form.category))]
    pub async fn create_product(
        &self,
        form: ProductForm,
        image: Option<ImageUpload>,
        now_ms: i64,
    ) -> Result<Product, DashboardError> {
        let image = image
            .filter(|i| !i.bytes.is_empty())
            .ok_or(DashboardError::MissingImage)?;
        let sizes = SizeSet::new(form.sizes).map_err(|_| DashboardError::NoSizes)?;
        let price = Price::parse(&form.price).map_err(DashboardError::InvalidPrice)?;
        let name = FormError::require("name", &form.name)?;

        let object = object_name(now_ms, &image.filename);
        let image_url = self
            .assets
            .upload(&object, &image.content_type, image.bytes)
            .await?;

        let row = NewProduct::new(&name, price, form.category, sizes, image_url)?;
        match self.catalog.insert_product(row).await {
            Ok(product) => {
                tracing::info!(product_id = %product.product_id, "Product created");
                Ok(product)
            }
            Err(e) => {
                tracing::warn!(%object, error = %e, "Product insert failed; uploaded image is orphaned");
                Err(e.into())
            }
        }
    }

    /// Delete a product after confirmation.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete_product(
        &self,
        id: ProductId,
        confirmation: Confirmation,
    ) -> Result<DeleteOutcome, StoreError> {
        if confirmation == Confirmation::No {
            return Ok(DeleteOutcome::Declined);
        }
        self.catalog.delete_product(id).await?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(DeleteOutcome::Deleted)
    }

    /// Mark an order verified.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the update fails.
    #[instrument(skip(self))]
    pub async fn complete_order(&self, id: OrderId) -> Result<Order, StoreError> {
        let order = self.orders.set_status(id, OrderStatus::Verified).await?;
        tracing::info!(order_id = %id, "Order verified");
        Ok(order)
    }

    /// Delete an order after confirmation.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete_order(
        &self,
        id: OrderId,
        confirmation: Confirmation,
    ) -> Result<DeleteOutcome, StoreError> {
        if confirmation == Confirmation::No {
            return Ok(DeleteOutcome::Declined);
        }
        self.orders.delete_order(id).await?;
        tracing::info!(order_id = %id, "Order deleted");
        Ok(DeleteOutcome::Deleted)
    }
}

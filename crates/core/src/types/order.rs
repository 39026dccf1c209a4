//! Order rows and the customer details collected at checkout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::form::FormError;
use super::id::{OrderId, ProductId};
use super::status::OrderStatus;

/// An order row as returned by the order store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub product_id: ProductId,
    pub customer_name: String,
    pub phone: String,
    pub address: String,
    /// Size code chosen in the bag. Stored as text and not re-checked
    /// against the product.
    pub size: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, OrderStatus::Pending)
    }
}

/// An order row before the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub product_id: ProductId,
    pub customer_name: String,
    pub phone: String,
    pub address: String,
    pub size: String,
    pub status: OrderStatus,
}

/// Validated checkout form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub phone: String,
    pub address: String,
}

impl CustomerDetails {
    /// Trim each field and require all three.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Blank`] for the first empty field in form order.
    pub fn new(name: &str, phone: &str, address: &str) -> Result<Self, FormError> {
        Ok(Self {
            name: FormError::require("name", name)?,
            phone: FormError::require("phone", phone)?,
            address: FormError::require("address", address)?,
        })
    }
}

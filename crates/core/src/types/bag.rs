//! The shopping bag.
//!
//! A bag is an ordered list of product snapshots, each with the size the
//! visitor picked and a `tempId` taken from the clock at add-time. It lives
//! entirely on the visitor's side until checkout turns it into order rows.
//!
//! The serialized form is a flat JSON array, one object per entry, holding
//! the product's fields plus `selectedSize` and `tempId`.

use serde::{Deserialize, Serialize};

use super::catalog::Size;
use super::id::ProductId;
use super::order::{CustomerDetails, NewOrder};
use super::price::Price;
use super::product::Product;
use super::status::OrderStatus;

/// Errors from bag mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BagError {
    /// The chosen size is not offered by the product snapshot.
    #[error("size {size} is not available for product {product_id}")]
    SizeUnavailable { product_id: ProductId, size: Size },
}

/// Millisecond timestamp identifying one bag entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempId(i64);

impl TempId {
    #[must_use]
    pub const fn new(millis: i64) -> Self {
        Self(millis)
    }

    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TempId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TempId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// One line of the bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BagEntry {
    #[serde(flatten)]
    pub product: Product,
    pub selected_size: Size,
    pub temp_id: TempId,
}

/// Ordered list of bag entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bag {
    entries: Vec<BagEntry>,
}

impl Bag {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Decode a persisted bag.
    ///
    /// Absent or unreadable data yields an empty bag rather than an error.
    #[must_use]
    pub fn from_json(raw: Option<&str>) -> Self {
        raw.and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default()
    }

    /// Encode the whole list for persistence.
    ///
    /// # Errors
    ///
    /// Returns the serializer error, which only happens for non-string map
    /// keys and so never for a bag in practice.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Append a sized snapshot of `product` and return the new entry's id.
    ///
    /// `now_ms` becomes the entry's `tempId`. If the clock has not moved past
    /// the newest entry, the id is bumped so ids stay unique within the bag.
    ///
    /// # Errors
    ///
    /// Returns [`BagError::SizeUnavailable`] if `size` is not in the
    /// snapshot's sizes.
    pub fn add(&mut self, product: Product, size: Size, now_ms: i64) -> Result<TempId, BagError> {
        if !product.sizes.contains(size) {
            return Err(BagError::SizeUnavailable {
                product_id: product.product_id,
                size,
            });
        }

        let newest = self.entries.iter().map(|e| e.temp_id.0).max();
        let temp_id = match newest {
            Some(last) if last >= now_ms => last.saturating_add(1),
            _ => now_ms,
        };

        let temp_id = TempId(temp_id);
        self.entries.push(BagEntry {
            product,
            selected_size: size,
            temp_id,
        });
        Ok(temp_id)
    }

    /// Remove the entry with `temp_id`, returning it if present.
    pub fn remove(&mut self, temp_id: TempId) -> Option<BagEntry> {
        let index = self.entries.iter().position(|e| e.temp_id == temp_id)?;
        Some(self.entries.remove(index))
    }

    /// Sum of entry prices.
    #[must_use]
    pub fn total(&self) -> Price {
        self.entries.iter().map(|e| e.product.price).sum()
    }

    #[must_use]
    pub fn entries(&self) -> &[BagEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// One pending order row per entry, in bag order.
    #[must_use]
    pub fn order_rows(&self, customer: &CustomerDetails) -> Vec<NewOrder> {
        self.entries
            .iter()
            .map(|entry| NewOrder {
                product_id: entry.product.product_id,
                customer_name: customer.name.clone(),
                phone: customer.phone.clone(),
                address: customer.address.clone(),
                size: entry.selected_size.as_str().to_owned(),
                status: OrderStatus::Pending,
            })
            .collect()
    }
}

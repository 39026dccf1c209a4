//! Checkout: turn the visitor's bag into pending order rows.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use thread_hanger_core::{CustomerDetails, FormError, Order};

use crate::bag::{BagRepository, VisitorBag};
use crate::store::{OrderStore, StoreError};

/// Message shown after a successful checkout.
pub const ORDER_PLACED: &str = "Order Placed Successfully!";

/// Errors from checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("your bag is empty")]
    EmptyBag,

    #[error("an order is already being placed")]
    AlreadySubmitting,

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Raw checkout form fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

/// Places orders, one submission per visitor at a time.
#[derive(Clone)]
pub struct CheckoutFlow {
    orders: Arc<dyn OrderStore>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Marks a visitor as submitting until dropped.
pub struct InFlightGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
    visitor: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.visitor);
    }
}

impl CheckoutFlow {
    #[must_use]
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self {
            orders,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Claim the submission slot for `visitor`, or `None` if it is taken.
    pub fn try_begin(&self, visitor: &str) -> Option<InFlightGuard> {
        let inserted = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(visitor.to_owned());
        inserted.then(|| InFlightGuard {
            in_flight: self.in_flight.clone(),
            visitor: visitor.to_owned(),
        })
    }

    /// Write one pending order per bag entry in a single batch, then clear
    /// the bag.
    ///
    /// Preconditions are checked before any store call. On a store failure
    /// the bag is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` for an empty bag, a blank form field, a
    /// concurrent submission, or a failed insert.
    #[instrument(skip(self, bag, form), fields(entries = bag.bag().len()))]
    pub async fn submit<R: BagRepository>(
        &self,
        visitor: &str,
        bag: &mut VisitorBag<R>,
        form: &CheckoutForm,
    ) -> Result<Vec<Order>, CheckoutError> {
        if bag.bag().is_empty() {
            return Err(CheckoutError::EmptyBag);
        }
        let customer = CustomerDetails::new(&form.name, &form.phone, &form.address)?;

        let _guard = self
            .try_begin(visitor)
            .ok_or(CheckoutError::AlreadySubmitting)?;

        let rows = bag.bag().order_rows(&customer);
        let placed = self.orders.insert_orders(rows).await?;
        tracing::info!(orders = placed.len(), total = %bag.total(), "Order placed");

        if let Err(e) = bag.clear().await {
            tracing::error!(error = %e, "Order placed but bag could not be cleared");
        }

        Ok(placed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use thread_hanger_core::{
        Category, NewOrder, OrderId, OrderStatus, Price, Product, ProductId, Size, SizeSet,
    };

    use super::*;
    use crate::bag::MemoryBagRepository;
    use crate::store::MockOrderStore;

    fn product(id: i64, price: u32) -> Product {
        Product {
            product_id: ProductId::new(id),
            name: format!("Dupatta {id}"),
            price: Price::new(price),
            category: Category::Women,
            sizes: SizeSet::new(Size::ALL).unwrap(),
            image_url: String::new(),
        }
    }

    fn form() -> CheckoutForm {
        CheckoutForm {
            name: "Sana".to_owned(),
            phone: "03001234567".to_owned(),
            address: "12 Mall Road, Lahore".to_owned(),
        }
    }

    fn stored(rows: Vec<NewOrder>) -> Vec<Order> {
        rows.into_iter()
            .zip(1..)
            .map(|(row, id)| Order {
                id: OrderId::new(id),
                product_id: row.product_id,
                customer_name: row.customer_name,
                phone: row.phone,
                address: row.address,
                size: row.size,
                status: row.status,
                created_at: Utc::now(),
            })
            .collect()
    }

    async fn two_item_bag(repo: &MemoryBagRepository) -> VisitorBag<MemoryBagRepository> {
        let mut bag = VisitorBag::open(repo.clone()).await;
        bag.add_at(product(1, 1500), Size::M, 1).await.unwrap();
        bag.add_at(product(2, 2500), Size::S, 2).await.unwrap();
        bag
    }

    #[tokio::test]
    async fn test_success_writes_one_pending_row_per_entry_and_clears_bag() {
        let mut orders = MockOrderStore::new();
        orders
            .expect_insert_orders()
            .withf(|rows| {
                rows.len() == 2
                    && rows.iter().all(|r| r.status == OrderStatus::Pending)
                    && rows.iter().all(|r| r.customer_name == "Sana")
            })
            .times(1)
            .returning(|rows| Ok(stored(rows)));

        let repo = MemoryBagRepository::new();
        let mut bag = two_item_bag(&repo).await;
        let flow = CheckoutFlow::new(Arc::new(orders));

        let placed = flow.submit("visitor", &mut bag, &form()).await.unwrap();
        assert_eq!(placed.len(), 2);
        assert_eq!(placed[0].size, "M");
        assert!(bag.bag().is_empty());
        assert!(repo.raw().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_bag_never_calls_store() {
        let mut orders = MockOrderStore::new();
        orders.expect_insert_orders().never();
        let flow = CheckoutFlow::new(Arc::new(orders));

        let mut bag = VisitorBag::open(MemoryBagRepository::new()).await;
        let err = flow.submit("visitor", &mut bag, &form()).await;
        assert!(matches!(err, Err(CheckoutError::EmptyBag)));
    }

    #[tokio::test]
    async fn test_blank_field_never_calls_store() {
        let mut orders = MockOrderStore::new();
        orders.expect_insert_orders().never();
        let flow = CheckoutFlow::new(Arc::new(orders));

        let repo = MemoryBagRepository::new();
        let mut bag = two_item_bag(&repo).await;
        let blank_phone = CheckoutForm {
            phone: "   ".to_owned(),
            ..form()
        };
        let err = flow.submit("visitor", &mut bag, &blank_phone).await;
        assert!(matches!(err, Err(CheckoutError::Form(FormError::Blank("phone")))));
        assert_eq!(bag.bag().len(), 2);
    }

    #[tokio::test]
    async fn test_store_failure_leaves_bag_untouched() {
        let mut orders = MockOrderStore::new();
        orders
            .expect_insert_orders()
            .returning(|_| Err(StoreError::Unavailable("timeout".to_owned())));
        let flow = CheckoutFlow::new(Arc::new(orders));

        let repo = MemoryBagRepository::new();
        let mut bag = two_item_bag(&repo).await;
        let before = repo.raw().await;

        let err = flow.submit("visitor", &mut bag, &form()).await.unwrap_err();
        assert_eq!(format!("Error: {err}"), "Error: store unavailable: timeout");
        assert_eq!(bag.bag().len(), 2);
        assert_eq!(repo.raw().await, before);
    }

    #[tokio::test]
    async fn test_concurrent_submission_is_rejected() {
        let mut orders = MockOrderStore::new();
        orders.expect_insert_orders().never();
        let flow = CheckoutFlow::new(Arc::new(orders));

        let repo = MemoryBagRepository::new();
        let mut bag = two_item_bag(&repo).await;

        let held = flow.try_begin("visitor").unwrap();
        let err = flow.submit("visitor", &mut bag, &form()).await;
        assert!(matches!(err, Err(CheckoutError::AlreadySubmitting)));

        drop(held);
        assert!(flow.try_begin("visitor").is_some());
    }

    #[tokio::test]
    async fn test_guard_released_after_failure() {
        let mut orders = MockOrderStore::new();
        orders
            .expect_insert_orders()
            .returning(|_| Err(StoreError::Unavailable("down".to_owned())));
        let flow = CheckoutFlow::new(Arc::new(orders));

        let repo = MemoryBagRepository::new();
        let mut bag = two_item_bag(&repo).await;
        assert!(flow.submit("visitor", &mut bag, &form()).await.is_err());
        assert!(flow.try_begin("visitor").is_some());
    }
}

//! Visitor bag persistence.
//!
//! The bag is per-visitor state: it lives in the visitor's durable session
//! under [`session_keys::BAG`] as a JSON string and never touches the order
//! store until checkout. Every mutation rewrites the whole list.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tower_sessions::Session;

use thread_hanger_core::{Bag, BagEntry, BagError, Price, Product, Size, TempId};

use crate::models::session_keys;

/// Errors writing the bag back to storage.
#[derive(Debug, Error)]
pub enum BagStorageError {
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("failed to encode bag: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors from bag actions.
#[derive(Debug, Error)]
pub enum VisitorBagError {
    #[error(transparent)]
    Bag(#[from] BagError),

    #[error(transparent)]
    Storage(#[from] BagStorageError),
}

/// Where a visitor's bag is persisted.
#[async_trait]
pub trait BagRepository: Send + Sync {
    /// Read the stored bag. Missing or unreadable data is an empty bag.
    async fn load(&self) -> Bag;

    /// Replace the stored bag.
    async fn save(&self, bag: &Bag) -> Result<(), BagStorageError>;

    /// Forget the stored bag.
    async fn clear(&self) -> Result<(), BagStorageError>;
}

/// Bag stored in the visitor's session record.
#[derive(Clone)]
pub struct SessionBagRepository {
    session: Session,
}

impl SessionBagRepository {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl BagRepository for SessionBagRepository {
    async fn load(&self) -> Bag {
        match self.session.get::<String>(session_keys::BAG).await {
            Ok(raw) => Bag::from_json(raw.as_deref()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read bag from session");
                Bag::new()
            }
        }
    }

    async fn save(&self, bag: &Bag) -> Result<(), BagStorageError> {
        let raw = bag.to_json()?;
        self.session.insert(session_keys::BAG, raw).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), BagStorageError> {
        self.session.remove::<String>(session_keys::BAG).await?;
        Ok(())
    }
}

/// Bag held as a raw JSON string in memory.
///
/// Clones share the same slot, so a test can keep one handle and inspect
/// exactly what was persisted.
#[derive(Clone, Default)]
pub struct MemoryBagRepository {
    raw: Arc<Mutex<Option<String>>>,
}

impl MemoryBagRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `raw` already stored, parseable or not.
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    /// The stored JSON, if any.
    pub async fn raw(&self) -> Option<String> {
        self.raw.lock().await.clone()
    }
}

#[async_trait]
impl BagRepository for MemoryBagRepository {
    async fn load(&self) -> Bag {
        Bag::from_json(self.raw.lock().await.as_deref())
    }

    async fn save(&self, bag: &Bag) -> Result<(), BagStorageError> {
        let raw = bag.to_json()?;
        *self.raw.lock().await = Some(raw);
        Ok(())
    }

    async fn clear(&self) -> Result<(), BagStorageError> {
        *self.raw.lock().await = None;
        Ok(())
    }
}

/// Whether the checkout panel may be shown. It never opens on an empty bag.
#[must_use]
pub fn checkout_panel_open(requested: bool, bag: &Bag) -> bool {
    requested && !bag.is_empty()
}

/// A visitor's bag for the duration of one request.
///
/// Loaded once on open; every mutation persists the full list before
/// returning.
pub struct VisitorBag<R> {
    repo: R,
    bag: Bag,
}

impl<R: BagRepository> VisitorBag<R> {
    pub async fn open(repo: R) -> Self {
        let bag = repo.load().await;
        Self { repo, bag }
    }

    #[must_use]
    pub const fn bag(&self) -> &Bag {
        &self.bag
    }

    #[must_use]
    pub fn total(&self) -> Price {
        self.bag.total()
    }

    /// Add `product` in `size`, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `VisitorBagError::Bag` if the size is not offered, or
    /// `VisitorBagError::Storage` if the bag could not be persisted.
    pub async fn add(&mut self, product: Product, size: Size) -> Result<TempId, VisitorBagError> {
        self.add_at(product, size, chrono::Utc::now().timestamp_millis())
            .await
    }

    /// [`VisitorBag::add`] with an explicit clock reading.
    ///
    /// # Errors
    ///
    /// See [`VisitorBag::add`].
    pub async fn add_at(
        &mut self,
        product: Product,
        size: Size,
        now_ms: i64,
    ) -> Result<TempId, VisitorBagError> {
        let product_id = product.product_id;
        let temp_id = self.bag.add(product, size, now_ms)?;
        self.repo.save(&self.bag).await?;
        tracing::debug!(%product_id, %size, %temp_id, "Added to bag");
        Ok(temp_id)
    }

    /// Remove the entry with `temp_id`. Unknown ids leave the bag as it was.
    ///
    /// # Errors
    ///
    /// Returns `BagStorageError` if the bag could not be persisted.
    pub async fn remove(&mut self, temp_id: TempId) -> Result<Option<BagEntry>, BagStorageError> {
        let removed = self.bag.remove(temp_id);
        if removed.is_some() {
            self.repo.save(&self.bag).await?;
        }
        Ok(removed)
    }

    /// Empty the bag in memory and in storage.
    ///
    /// # Errors
    ///
    /// Returns `BagStorageError` if storage could not be cleared.
    pub async fn clear(&mut self) -> Result<(), BagStorageError> {
        self.bag.clear();
        self.repo.clear().await
    }
}

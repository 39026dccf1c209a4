//! Catalog view: one category at a time.
//!
//! Every page view queries the catalog store. The last successful listing
//! per category is kept in a `moka` cache so a failed query can fall back to
//! it instead of showing an error.
//!
//! Pages are rendered only after the query has finished, whether it
//! succeeded or not, so a listing never reaches the template half-loaded.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::instrument;

use thread_hanger_core::{Category, Product, ProductId};

use crate::store::CatalogStore;

/// What a catalog page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogState {
    /// The fetch completed with no products.
    ComingSoon,
    /// At least one product to show.
    Products,
}

/// Pick the catalog state from the size of a completed listing.
#[must_use]
pub const fn render_state(product_count: usize) -> CatalogState {
    if product_count == 0 {
        CatalogState::ComingSoon
    } else {
        CatalogState::Products
    }
}

/// Placeholder heading for an empty category.
#[must_use]
pub fn coming_soon_message(category: Category) -> String {
    format!("{}'s Collection Coming Soon", category.as_str())
}

/// The products of one category as rendered on one page.
#[derive(Debug, Clone)]
pub struct CategoryListing {
    pub category: Category,
    pub products: Arc<Vec<Product>>,
}

impl CategoryListing {
    #[must_use]
    pub fn state(&self) -> CatalogState {
        render_state(self.products.len())
    }

    /// The snapshot a size selector opens on.
    #[must_use]
    pub fn find(&self, product_id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.product_id == product_id)
    }
}

/// Reads categories from the catalog store with a last-good fallback.
#[derive(Clone)]
pub struct CatalogView {
    catalog: Arc<dyn CatalogStore>,
    last_good: Cache<Category, Arc<Vec<Product>>>,
}

impl CatalogView {
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogStore>, ttl: Duration) -> Self {
        let last_good = Cache::builder()
            .max_capacity(Category::ALL.len() as u64)
            .time_to_live(ttl)
            .build();
        Self { catalog, last_good }
    }

    /// Query one category by exact match.
    ///
    /// A store failure is logged and the previous successful listing (or an
    /// empty one) is returned.
    #[instrument(skip(self))]
    pub async fn fetch_category(&self, category: Category) -> CategoryListing {
        let products = match self.catalog.list_products(Some(category)).await {
            Ok(products) => {
                let products = Arc::new(products);
                self.last_good.insert(category, products.clone()).await;
                products
            }
            Err(e) => {
                tracing::warn!(%category, error = %e, "Catalog fetch failed, keeping previous listing");
                self.last_good.get(&category).await.unwrap_or_default()
            }
        };

        CategoryListing { category, products }
    }

    /// Drop every fallback listing, e.g. after the admin changes inventory.
    pub async fn invalidate_all(&self) {
        self.last_good.invalidate_all();
        self.last_good.run_pending_tasks().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use thread_hanger_core::{Price, Size, SizeSet};

    use super::*;
    use crate::store::{MockCatalogStore, StoreError};

    fn product(id: i64) -> Product {
        Product {
            product_id: ProductId::new(id),
            name: format!("Shirt {id}"),
            price: Price::new(1500),
            category: Category::Men,
            sizes: SizeSet::new([Size::M]).unwrap(),
            image_url: String::new(),
        }
    }

    fn view(store: MockCatalogStore) -> CatalogView {
        CatalogView::new(Arc::new(store), Duration::from_secs(60))
    }

    #[test]
    fn test_render_state() {
        assert_eq!(render_state(0), CatalogState::ComingSoon);
        assert_eq!(render_state(1), CatalogState::Products);
    }

    #[test]
    fn test_coming_soon_message() {
        assert_eq!(
            coming_soon_message(Category::Women),
            "Women's Collection Coming Soon"
        );
    }

    #[tokio::test]
    async fn test_empty_category_is_coming_soon() {
        let mut store = MockCatalogStore::new();
        store
            .expect_list_products()
            .withf(|c| *c == Some(Category::Women))
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let listing = view(store).fetch_category(Category::Women).await;
        assert_eq!(listing.state(), CatalogState::ComingSoon);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_listing() {
        let mut store = MockCatalogStore::new();
        let mut seq = mockall::Sequence::new();
        store
            .expect_list_products()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![product(1), product(2)]));
        store
            .expect_list_products()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(StoreError::Unavailable("down".to_owned())));

        let view = view(store);
        let first = view.fetch_category(Category::Men).await;
        let second = view.fetch_category(Category::Men).await;

        assert_eq!(second.products, first.products);
        assert_eq!(second.state(), CatalogState::Products);
    }

    #[tokio::test]
    async fn test_failure_without_history_is_coming_soon() {
        let mut store = MockCatalogStore::new();
        store
            .expect_list_products()
            .returning(|_| Err(StoreError::Unavailable("down".to_owned())));

        let listing = view(store).fetch_category(Category::Men).await;
        assert!(listing.products.is_empty());
        assert_eq!(listing.state(), CatalogState::ComingSoon);
    }

    #[tokio::test]
    async fn test_find_uses_rendered_snapshot() {
        let mut store = MockCatalogStore::new();
        store
            .expect_list_products()
            .returning(|_| Ok(vec![product(7)]));

        let listing = view(store).fetch_category(Category::Men).await;
        assert_eq!(listing.find(ProductId::new(7)).unwrap().name, "Shirt 7");
        assert!(listing.find(ProductId::new(8)).is_none());
    }
}

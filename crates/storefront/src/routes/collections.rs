//! Men and Women collection pages.
//!
//! One page per category. Query parameters drive the two overlays:
//! `?select=<product_id>` opens the size selector for a product from this
//! listing, and `?bag=open` opens the checkout panel (ignored while the bag
//! is empty).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use thread_hanger_core::{Bag, Category, Price, Product, ProductId};

use crate::bag::{SessionBagRepository, VisitorBag, checkout_panel_open};
use crate::catalog::{CatalogState, CategoryListing, coming_soon_message};
use crate::checkout::CheckoutForm;
use crate::filters;
use crate::middleware::take_flash;
use crate::models::Flash;
use crate::state::AppState;

/// Query parameters for a collection page.
#[derive(Debug, Default, Deserialize)]
pub struct CollectionQuery {
    pub select: Option<String>,
    pub bag: Option<String>,
}

/// Product card data for templates.
#[derive(Clone)]
pub struct ProductCard {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub category: &'static str,
    pub image_url: String,
    /// Size codes, comma separated, carried in the add-to-bag form.
    pub sizes_csv: String,
    pub sizes: Vec<&'static str>,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            id: product.product_id,
            name: product.name.clone(),
            price: product.price,
            category: product.category.as_str(),
            image_url: product.image_url.clone(),
            sizes_csv: product.sizes.to_csv(),
            sizes: product.sizes.iter().map(|s| s.as_str()).collect(),
        }
    }
}

/// Bag line data for templates.
#[derive(Clone)]
pub struct BagLine {
    pub temp_id: String,
    pub name: String,
    pub size: &'static str,
    pub price: Price,
}

/// Bag display data for templates.
#[derive(Clone)]
pub struct BagView {
    pub lines: Vec<BagLine>,
    pub count: usize,
    pub total: Price,
    pub open: bool,
}

impl BagView {
    #[must_use]
    pub fn new(bag: &Bag, open_requested: bool) -> Self {
        Self {
            lines: bag
                .entries()
                .iter()
                .map(|entry| BagLine {
                    temp_id: entry.temp_id.to_string(),
                    name: entry.product.name.clone(),
                    size: entry.selected_size.as_str(),
                    price: entry.product.price,
                })
                .collect(),
            count: bag.len(),
            total: bag.total(),
            open: checkout_panel_open(open_requested, bag),
        }
    }
}

/// Collection page template.
#[derive(Template, WebTemplate)]
#[template(path = "collection.html")]
pub struct CollectionTemplate {
    pub category: &'static str,
    pub path: &'static str,
    pub heading: &'static str,
    pub coming_soon: Option<String>,
    pub products: Vec<ProductCard>,
    pub selected: Option<ProductCard>,
    pub bag: BagView,
    pub checkout: CheckoutForm,
    pub flash: Option<Flash>,
}

/// Everything needed to render one collection page.
pub struct CollectionPage<'a> {
    pub listing: &'a CategoryListing,
    pub selected: Option<ProductId>,
    pub bag: &'a Bag,
    pub bag_open: bool,
    pub checkout: CheckoutForm,
    pub flash: Option<Flash>,
}

impl CollectionPage<'_> {
    #[must_use]
    pub fn render(self) -> CollectionTemplate {
        let category = self.listing.category;
        let state = self.listing.state();
        CollectionTemplate {
            category: category.as_str(),
            path: category.path(),
            heading: category.heading(),
            coming_soon: (state == CatalogState::ComingSoon).then(|| coming_soon_message(category)),
            products: self.listing.products.iter().map(ProductCard::from).collect(),
            selected: self
                .selected
                .and_then(|id| self.listing.find(id))
                .map(ProductCard::from),
            bag: BagView::new(self.bag, self.bag_open),
            checkout: self.checkout,
            flash: self.flash,
        }
    }
}

/// Men's collection.
pub async fn men(
    state: State<AppState>,
    session: Session,
    query: Query<CollectionQuery>,
) -> impl IntoResponse {
    show(Category::Men, state, session, query).await
}

/// Women's collection.
pub async fn women(
    state: State<AppState>,
    session: Session,
    query: Query<CollectionQuery>,
) -> impl IntoResponse {
    show(Category::Women, state, session, query).await
}

#[instrument(skip(state, session))]
async fn show(
    category: Category,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CollectionQuery>,
) -> CollectionTemplate {
    let listing = state.catalog().fetch_category(category).await;
    let bag = VisitorBag::open(SessionBagRepository::new(session.clone())).await;
    let flash = take_flash(&session).await;

    CollectionPage {
        listing: &listing,
        selected: query.select.as_deref().and_then(|s| s.parse().ok()),
        bag: bag.bag(),
        bag_open: query.bag.as_deref() == Some("open"),
        checkout: CheckoutForm::default(),
        flash,
    }
    .render()
}

//! Bag and checkout route handlers.
//!
//! The add-to-bag form carries the product snapshot that was on screen, so
//! adding never re-reads the catalog.

use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use thread_hanger_core::{Category, Price, Product, ProductId, Size, SizeSet, TempId};

use crate::bag::{SessionBagRepository, VisitorBag, VisitorBagError};
use crate::checkout::{CheckoutError, CheckoutForm, ORDER_PLACED};
use crate::error::{AppError, Result};
use crate::middleware::{set_flash, visitor_id};
use crate::models::Flash;
use crate::routes::collections::CollectionPage;
use crate::state::AppState;

/// Add-to-bag form: the product snapshot plus the chosen size.
#[derive(Debug, Deserialize)]
pub struct AddToBagForm {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub category: Category,
    /// Comma-separated size codes of the snapshot.
    pub sizes: String,
    pub image_url: String,
    pub size: Size,
}

impl AddToBagForm {
    fn into_parts(self) -> Result<(Product, Size)> {
        let sizes = SizeSet::parse_csv(&self.sizes)
            .map_err(|e| AppError::BadRequest(format!("sizes: {e}")))?;
        let product = Product {
            product_id: self.product_id,
            name: self.name,
            price: self.price,
            category: self.category,
            sizes,
            image_url: self.image_url,
        };
        Ok((product, self.size))
    }
}

/// Remove-from-bag form.
#[derive(Debug, Deserialize)]
pub struct RemoveFromBagForm {
    pub temp_id: TempId,
    pub category: Category,
}

/// Checkout form with the page it was submitted from.
#[derive(Debug, Deserialize)]
pub struct CheckoutSubmission {
    pub category: Category,
    #[serde(flatten)]
    pub form: CheckoutForm,
}

fn bag_for(session: &Session) -> SessionBagRepository {
    SessionBagRepository::new(session.clone())
}

/// Add a sized product to the bag and close the size selector.
#[instrument(skip(session, form), fields(product_id = %form.product_id, size = %form.size))]
pub async fn add(session: Session, Form(form): Form<AddToBagForm>) -> Result<Redirect> {
    let category = form.category;
    let (product, size) = form.into_parts()?;

    // A non-empty bag always belongs to a known visitor, so checkout can
    // hold that visitor's in-flight slot from the first submission on.
    visitor_id(&session).await?;

    let mut bag = VisitorBag::open(bag_for(&session)).await;
    match bag.add(product, size).await {
        Ok(_) => {}
        Err(VisitorBagError::Bag(e)) => set_flash(&session, Flash::error(e.to_string())).await,
        Err(VisitorBagError::Storage(e)) => return Err(e.into()),
    }

    Ok(Redirect::to(category.path()))
}

/// Remove one bag entry. The panel stays open unless the bag is now empty.
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<RemoveFromBagForm>) -> Result<Redirect> {
    let mut bag = VisitorBag::open(bag_for(&session)).await;
    bag.remove(form.temp_id).await?;

    let path = form.category.path();
    if bag.bag().is_empty() {
        Ok(Redirect::to(path))
    } else {
        Ok(Redirect::to(&format!("{path}?bag=open")))
    }
}

/// Place the order.
///
/// On success the bag is cleared and the visitor returns to the collection
/// with a confirmation. On failure the page is rendered again with the
/// panel open and the form as typed.
#[instrument(skip(state, session, submission), fields(category = %submission.category))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    Form(submission): Form<CheckoutSubmission>,
) -> Result<Response> {
    let CheckoutSubmission { category, form } = submission;
    let visitor = visitor_id(&session).await?;
    let mut bag = VisitorBag::open(bag_for(&session)).await;

    match state.checkout().submit(&visitor, &mut bag, &form).await {
        Ok(_) => {
            set_flash(&session, Flash::success(ORDER_PLACED)).await;
            Ok(Redirect::to(category.path()).into_response())
        }
        Err(CheckoutError::EmptyBag) => Ok(Redirect::to(category.path()).into_response()),
        Err(e) => {
            tracing::warn!(error = %e, "Checkout failed");
            let listing = state.catalog().fetch_category(category).await;
            Ok(CollectionPage {
                listing: &listing,
                selected: None,
                bag: bag.bag(),
                bag_open: true,
                checkout: form,
                flash: Some(Flash::error(format!("Error: {e}"))),
            }
            .render()
            .into_response())
        }
    }
}

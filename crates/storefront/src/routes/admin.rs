//! Admin dashboard route handlers.
//!
//! Every handler takes [`RequireAdmin`], so a visitor without an admin
//! session is redirected home before anything is loaded. Mutations flash
//! their outcome and redirect back to the dashboard, which reloads
//! everything.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use thread_hanger_core::{Category, Order, OrderId, OrderStatus, Price, Product, ProductId, Size};

use crate::dashboard::{
    CONFIRM_DELETE_ORDER, CONFIRM_DELETE_PRODUCT, Confirmation, DashboardSnapshot, DeleteOutcome,
    ImageUpload, ProductForm, SYNCED,
};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAdmin, set_flash, take_flash};
use crate::models::Flash;
use crate::state::AppState;

/// Which overlay of the dashboard is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    Inventory,
    Pending,
    Completed,
}

impl Panel {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Inventory => "INVENTORY",
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
        }
    }
}

/// Query parameters for the dashboard.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub panel: Option<Panel>,
}

/// Product row data for templates.
pub struct ProductRow {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub sizes: String,
    pub image_url: String,
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        Self {
            id: product.product_id,
            name: product.name.clone(),
            price: product.price,
            sizes: product.sizes.join(", "),
            image_url: product.image_url.clone(),
        }
    }
}

/// One category section of the inventory panel.
pub struct CategorySection {
    pub title: String,
    pub products: Vec<ProductRow>,
}

/// Order row data for templates.
pub struct OrderRow {
    pub id: OrderId,
    pub customer_name: String,
    pub phone: String,
    pub address: String,
    pub product_id: ProductId,
    pub product_name: Option<String>,
    pub size: String,
    pub status: &'static str,
    pub pending: bool,
    pub placed_at: String,
}

impl OrderRow {
    fn new(order: &Order, snapshot: &DashboardSnapshot) -> Self {
        Self {
            id: order.id,
            customer_name: order.customer_name.clone(),
            phone: order.phone.clone(),
            address: order.address.clone(),
            product_id: order.product_id,
            product_name: snapshot.product_name(order.product_id).map(String::from),
            size: order.size.clone(),
            status: order.status.as_str(),
            pending: order.is_pending(),
            placed_at: order.created_at.format("%d %b %Y %H:%M").to_string(),
        }
    }
}

/// Size chip data for the product form.
pub struct SizeOption {
    pub code: &'static str,
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub admin_email: String,
    pub inventory_count: usize,
    pub pending_count: usize,
    pub completed_count: usize,
    pub panel_title: Option<&'static str>,
    pub sections: Vec<CategorySection>,
    pub orders: Vec<OrderRow>,
    pub sizes: Vec<SizeOption>,
    pub categories: Vec<&'static str>,
    pub load_error: Option<String>,
    pub flash: Option<Flash>,
}

impl DashboardTemplate {
    fn new(
        admin_email: String,
        snapshot: &DashboardSnapshot,
        panel: Option<Panel>,
        load_error: Option<String>,
        flash: Option<Flash>,
    ) -> Self {
        let sections = if panel == Some(Panel::Inventory) {
            Category::ALL
                .into_iter()
                .map(|category| CategorySection {
                    title: format!("{}'s Section", category.as_str()),
                    products: snapshot.in_category(category).map(ProductRow::from).collect(),
                })
                .collect()
        } else {
            Vec::new()
        };

        let wanted = match panel {
            Some(Panel::Pending) => Some(OrderStatus::Pending),
            Some(Panel::Completed) => Some(OrderStatus::Verified),
            _ => None,
        };
        let orders = wanted
            .map(|status| {
                snapshot
                    .orders
                    .iter()
                    .filter(|o| o.status == status)
                    .map(|o| OrderRow::new(o, snapshot))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            admin_email,
            inventory_count: snapshot.inventory_count(),
            pending_count: snapshot.pending_count(),
            completed_count: snapshot.completed_count(),
            panel_title: panel.map(Panel::title),
            sections,
            orders,
            sizes: Size::ALL.into_iter().map(|s| SizeOption { code: s.as_str() }).collect(),
            categories: Category::ALL.into_iter().map(Category::as_str).collect(),
            load_error,
            flash,
        }
    }
}

/// Delete confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/confirm_delete.html")]
pub struct ConfirmDeleteTemplate {
    pub prompt: &'static str,
    pub action: String,
    pub back: &'static str,
}

/// Delete confirmation form.
#[derive(Debug, Deserialize)]
pub struct ConfirmForm {
    pub confirm: Confirmation,
}

/// Display the dashboard.
#[instrument(skip(state, session, admin))]
pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<DashboardQuery>,
) -> DashboardTemplate {
    let (snapshot, load_error) = match state.dashboard().load_all().await {
        Ok(snapshot) => (snapshot, None),
        Err(e) => {
            tracing::warn!(error = %e, "Dashboard load failed");
            (DashboardSnapshot::default(), Some(e.to_string()))
        }
    };

    DashboardTemplate::new(
        admin.email.to_string(),
        &snapshot,
        query.panel,
        load_error,
        take_flash(&session).await,
    )
}

/// Read the multipart "add product" form.
async fn read_product_form(
    mut multipart: Multipart,
) -> Result<(ProductForm, Option<ImageUpload>)> {
    let mut name = String::new();
    let mut price = String::new();
    let mut category = Category::Men;
    let mut sizes = Vec::new();
    let mut image = None;

    let bad = |e: axum::extract::multipart::MultipartError| AppError::BadRequest(e.to_string());

    while let Some(field) = multipart.next_field().await.map_err(bad)? {
        let field_name = field.name().unwrap_or_default().to_owned();
        match field_name.as_str() {
            "name" => name = field.text().await.map_err(bad)?,
            "price" => price = field.text().await.map_err(bad)?,
            "category" => {
                let raw = field.text().await.map_err(bad)?;
                category = raw.parse().map_err(AppError::BadRequest)?;
            }
            "sizes" => {
                let raw = field.text().await.map_err(bad)?;
                sizes.push(raw.parse::<Size>().map_err(AppError::BadRequest)?);
            }
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_owned();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_owned();
                let bytes = field.bytes().await.map_err(bad)?;
                if !filename.is_empty() && !bytes.is_empty() {
                    image = Some(ImageUpload {
                        filename,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok((
        ProductForm {
            name,
            price,
            category,
            sizes,
        },
        image,
    ))
}

/// Create a product from the inventory form.
#[instrument(skip_all)]
pub async fn create_product(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(_admin): RequireAdmin,
    multipart: Multipart,
) -> Result<Redirect> {
    let (form, image) = read_product_form(multipart).await?;
    let now_ms = chrono::Utc::now().timestamp_millis();

    match state.dashboard().create_product(form, image, now_ms).await {
        Ok(_) => {
            state.catalog().invalidate_all().await;
            set_flash(&session, Flash::success(SYNCED)).await;
        }
        Err(e) => set_flash(&session, Flash::error(e.to_string())).await,
    }

    Ok(Redirect::to("/admin"))
}

/// Ask before deleting a product.
pub async fn confirm_delete_product(
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> ConfirmDeleteTemplate {
    ConfirmDeleteTemplate {
        prompt: CONFIRM_DELETE_PRODUCT,
        action: format!("/admin/products/{id}/delete"),
        back: "/admin?panel=inventory",
    }
}

/// Delete a product once confirmed.
#[instrument(skip(state, session, _admin))]
pub async fn delete_product(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Form(form): Form<ConfirmForm>,
) -> Redirect {
    match state.dashboard().delete_product(id, form.confirm).await {
        Ok(DeleteOutcome::Deleted) => state.catalog().invalidate_all().await,
        Ok(DeleteOutcome::Declined) => {}
        Err(e) => set_flash(&session, Flash::error(format!("Delete failed: {e}"))).await,
    }
    Redirect::to("/admin?panel=inventory")
}

/// Mark an order verified.
#[instrument(skip(state, session, _admin))]
pub async fn complete_order(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Redirect {
    if let Err(e) = state.dashboard().complete_order(id).await {
        set_flash(&session, Flash::error(e.to_string())).await;
    }
    Redirect::to("/admin?panel=pending")
}

/// Ask before deleting an order.
pub async fn confirm_delete_order(
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> ConfirmDeleteTemplate {
    ConfirmDeleteTemplate {
        prompt: CONFIRM_DELETE_ORDER,
        action: format!("/admin/orders/{id}/delete"),
        back: "/admin?panel=pending",
    }
}

/// Delete an order once confirmed.
#[instrument(skip(state, session, _admin))]
pub async fn delete_order(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Form(form): Form<ConfirmForm>,
) -> Redirect {
    if let Err(e) = state.dashboard().delete_order(id, form.confirm).await {
        set_flash(&session, Flash::error(format!("Delete failed: {e}"))).await;
    }
    Redirect::to("/admin")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use thread_hanger_core::SizeSet;

    use super::*;

    fn snapshot() -> DashboardSnapshot {
        let product = Product {
            product_id: ProductId::new(1),
            name: "Khaddar Shawl".to_owned(),
            price: Price::new(1800),
            category: Category::Women,
            sizes: SizeSet::new([Size::M, Size::L]).unwrap(),
            image_url: "https://cdn.test/s.jpg".to_owned(),
        };
        let order = |id, status| Order {
            id: OrderId::new(id),
            product_id: ProductId::new(1),
            customer_name: "Amna".to_owned(),
            phone: "0333".to_owned(),
            address: "Multan".to_owned(),
            size: "M".to_owned(),
            status,
            created_at: Utc::now(),
        };
        DashboardSnapshot {
            products: vec![product],
            orders: vec![order(2, OrderStatus::Pending), order(1, OrderStatus::Verified)],
        }
    }

    fn template(panel: Option<Panel>) -> DashboardTemplate {
        DashboardTemplate::new("owner@shop.pk".to_owned(), &snapshot(), panel, None, None)
    }

    #[test]
    fn test_counts() {
        let t = template(None);
        assert_eq!(
            (t.inventory_count, t.pending_count, t.completed_count),
            (1, 1, 1)
        );
        assert!(t.orders.is_empty());
        assert!(t.sections.is_empty());
    }

    #[test]
    fn test_pending_panel_lists_pending_only() {
        let t = template(Some(Panel::Pending));
        assert_eq!(t.orders.len(), 1);
        assert!(t.orders.iter().all(|o| o.pending));
        assert_eq!(t.orders.first().unwrap().product_name.as_deref(), Some("Khaddar Shawl"));
    }

    #[test]
    fn test_inventory_panel_groups_by_category() {
        let t = template(Some(Panel::Inventory));
        let titles: Vec<_> = t.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Men's Section", "Women's Section"]);
        assert!(t.sections.first().unwrap().products.is_empty());
        assert_eq!(t.sections.last().unwrap().products.first().unwrap().sizes, "M, L");
    }

    #[test]
    fn test_dashboard_renders() {
        let html = template(Some(Panel::Completed)).render().unwrap();
        assert!(html.contains("COMPLETED"));
        assert!(html.contains("Sync to Boutique"));
    }
}

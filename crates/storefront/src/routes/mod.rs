//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Home page (?login=open shows the admin login form)
//! POST /login                         - Admin sign-in (rate limited)
//!
//! # Collections
//! GET  /men                           - Men's collection (?select=<id>, ?bag=open)
//! GET  /women                         - Women's collection (?select=<id>, ?bag=open)
//!
//! # Bag
//! POST /bag/add                       - Add a sized product snapshot
//! POST /bag/remove                    - Remove one entry
//! POST /checkout                      - Place the order
//!
//! # Admin (requires admin session, otherwise redirects to /)
//! GET  /admin                         - Dashboard (?panel=inventory|pending|completed)
//! POST /admin/products                - Create product (multipart, with image)
//! GET  /admin/products/{id}/delete    - Confirm product deletion
//! POST /admin/products/{id}/delete    - Delete product
//! POST /admin/orders/{id}/complete    - Mark order verified
//! GET  /admin/orders/{id}/delete      - Confirm order deletion
//! POST /admin/orders/{id}/delete      - Delete order
//! POST /admin/logout                  - Sign out
//!
//! *                                   - Anything else redirects to /
//! ```

pub mod admin;
pub mod auth;
pub mod bag;
pub mod collections;
pub mod home;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{get, post},
};

use crate::middleware::login_rate_limiter;
use crate::state::AppState;

/// Largest accepted product image upload.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Create the admin routes router (mounted under `/admin`).
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            post(admin::create_product).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/products/{id}/delete",
            get(admin::confirm_delete_product).post(admin::delete_product),
        )
        .route("/orders/{id}/complete", post(admin::complete_order))
        .route(
            "/orders/{id}/delete",
            get(admin::confirm_delete_order).post(admin::delete_order),
        )
        .route("/logout", post(auth::logout))
}

/// Create the storefront router (without state or outer layers).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::show))
        .route("/login", post(auth::login).layer(login_rate_limiter()))
        .route("/men", get(collections::men))
        .route("/women", get(collections::women))
        .route("/bag/add", post(bag::add))
        .route("/bag/remove", post(bag::remove))
        .route("/checkout", post(bag::checkout))
        .route("/admin", get(admin::dashboard))
        .nest("/admin", admin_routes())
        .fallback(fallback)
}

/// Unknown paths go home.
async fn fallback() -> Redirect {
    Redirect::to("/")
}

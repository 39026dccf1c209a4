//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::Query;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::middleware::take_flash;
use crate::models::{Flash, session_keys};

/// Storefront contact details shown in the footer.
pub const CONTACT_ADDRESS: &str = "Liberty Market, Lahore, Pakistan";
pub const CONTACT_PHONE: &str = "+92 300 1234567";

/// Query parameters for the home page.
#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    pub login: Option<String>,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub login_open: bool,
    pub login_error: Option<String>,
    pub address: &'static str,
    pub phone: &'static str,
    pub flash: Option<Flash>,
}

/// Display the home page, optionally with the admin login form open.
#[instrument(skip(session))]
pub async fn show(session: Session, Query(query): Query<HomeQuery>) -> HomeTemplate {
    let login_error = session
        .remove::<String>(session_keys::LOGIN_ERROR)
        .await
        .ok()
        .flatten();

    HomeTemplate {
        login_open: query.login.as_deref() == Some("open") || login_error.is_some(),
        login_error,
        address: CONTACT_ADDRESS,
        phone: CONTACT_PHONE,
        flash: take_flash(&session).await,
    }
}

//! Integration tests for Thread and Hanger.
//!
//! Each test spawns the full storefront router on an ephemeral port, backed
//! by the in-memory store, the local identity provider, and a `SQLite`
//! session file in a temporary directory, and drives it with a
//! cookie-keeping `reqwest` client that does not follow redirects.
//!
//! ```bash
//! cargo test -p thread-hanger-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode, header::LOCATION, redirect::Policy};
use secrecy::SecretString;
use tempfile::TempDir;

use thread_hanger_core::{Category, Email, NewProduct, Price, Product, Size, SizeSet};
use thread_hanger_storefront::build_app;
use thread_hanger_storefront::config::{BackendConfig, IdentityConfig, StorefrontConfig};
use thread_hanger_storefront::identity::{LocalIdentity, hash_password};
use thread_hanger_storefront::middleware::SessionBackend;
use thread_hanger_storefront::state::AppState;
use thread_hanger_storefront::store::{Backends, CatalogStore, InMemoryBackend};

pub const ADMIN_EMAIL: &str = "owner@threadandhanger.pk";
pub const ADMIN_PASSWORD: &str = "lahore-liberty-2024";

/// A running storefront plus handles to inspect it.
pub struct TestApp {
    pub address: SocketAddr,
    pub client: Client,
    pub store: InMemoryBackend,
    pub state: AppState,
    session_dir: Arc<TempDir>,
}

impl TestApp {
    /// Spawn the app on `127.0.0.1:0`.
    pub async fn spawn() -> Self {
        let store = InMemoryBackend::new("http://127.0.0.1/uploads");
        let backends = Backends::in_memory(store.clone());
        Self::spawn_with(store, backends).await
    }

    /// Spawn the app over `backends`; `store` is what tests inspect.
    pub async fn spawn_with(store: InMemoryBackend, backends: Backends) -> Self {
        let session_dir = Arc::new(tempfile::tempdir().unwrap());
        Self::serve(store, backends, session_dir, visitor_client()).await
    }

    /// Build fresh application state and a new server over the same stores
    /// and session file. The returned app shares this app's cookie jar.
    pub async fn restart(&self) -> Self {
        Self::serve(
            self.store.clone(),
            Backends::in_memory(self.store.clone()),
            self.session_dir.clone(),
            self.client.clone(),
        )
        .await
    }

    async fn serve(
        store: InMemoryBackend,
        backends: Backends,
        session_dir: Arc<TempDir>,
        client: Client,
    ) -> Self {
        let password_hash = hash_password(ADMIN_PASSWORD).unwrap();
        let email = Email::parse(ADMIN_EMAIL).unwrap();
        let session_db = session_dir.path().join("sessions.db");

        let config = StorefrontConfig {
            host: Ipv4Addr::LOCALHOST.into(),
            port: 0,
            base_url: "http://127.0.0.1".to_owned(),
            backend: BackendConfig::Memory {
                upload_dir: PathBuf::from("uploads"),
            },
            identity: IdentityConfig::Local {
                email: email.clone(),
                password_hash: SecretString::from(password_hash.clone()),
            },
            catalog_cache_ttl: Duration::from_secs(300),
            session_db: session_db.clone(),
            sentry_dsn: None,
            sentry_environment: None,
        };

        let identity = Arc::new(LocalIdentity::new(
            email,
            SecretString::from(password_hash),
        ));
        let sessions = SessionBackend::sqlite(&session_db).await.unwrap();
        let state = AppState::new(config, backends, sessions, identity);
        let app = build_app(state.clone());

        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        Self {
            address,
            client,
            store,
            state,
            session_dir,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.address)
    }

    /// A second visitor with its own cookie jar.
    #[must_use]
    pub fn new_visitor(&self) -> Client {
        visitor_client()
    }

    /// Insert a product straight into the store.
    pub async fn seed_product(
        &self,
        name: &str,
        price: u32,
        category: Category,
        sizes: &[Size],
    ) -> Product {
        self.store
            .insert_product(NewProduct {
                name: name.to_owned(),
                price: Price::new(price),
                category,
                sizes: SizeSet::new(sizes.iter().copied()).unwrap(),
                image_url: format!("https://cdn.test/{}.jpg", name.to_lowercase().replace(' ', "-")),
            })
            .await
            .unwrap()
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    /// GET `path` and return the body, asserting a 200.
    pub async fn get_html(&self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {path}");
        response.text().await.unwrap()
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .unwrap()
    }

    /// Add `product` in `size` to this client's bag using the on-page snapshot.
    pub async fn add_to_bag(&self, product: &Product, size: Size) -> Response {
        let id = product.product_id.to_string();
        let price = product.price.units().to_string();
        let sizes = product.sizes.to_csv();
        self.post_form(
            "/bag/add",
            &[
                ("product_id", id.as_str()),
                ("name", product.name.as_str()),
                ("price", price.as_str()),
                ("category", product.category.as_str()),
                ("sizes", sizes.as_str()),
                ("image_url", product.image_url.as_str()),
                ("size", size.as_str()),
            ],
        )
        .await
    }

    /// Sign in as the configured admin.
    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.post_form("/login", &[("email", email), ("password", password)])
            .await
    }

    pub async fn login_as_admin(&self) {
        let response = self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(location(&response), "/admin");
    }
}

/// A cookie-keeping client that does not follow redirects.
fn visitor_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .unwrap()
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response) -> String {
    assert!(
        response.status().is_redirection(),
        "expected redirect, got {}",
        response.status()
    );
    response.headers()[LOCATION].to_str().unwrap().to_owned()
}

/// Every `value` attribute following `name="{field}"` in `html`.
#[must_use]
pub fn field_values(html: &str, field: &str) -> Vec<String> {
    let marker = format!("name=\"{field}\" value=\"");
    html.match_indices(&marker)
        .filter_map(|(start, _)| {
            let rest = html.get(start + marker.len()..)?;
            rest.split('"').next().map(str::to_owned)
        })
        .collect()
}

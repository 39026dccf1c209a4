//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::CatalogView;
use crate::checkout::CheckoutFlow;
use crate::config::{IdentityConfig, StorefrontConfig};
use crate::dashboard::AdminDashboard;
use crate::identity::{
    AuthEvents, IdentityError, IdentityProvider, LocalIdentity, PasswordSignInClient,
};
use crate::middleware::SessionBackend;
use crate::store::{Backends, StoreError};

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("store setup failed: {0}")]
    Store(#[from] StoreError),
    #[error("identity provider setup failed: {0}")]
    Identity(#[from] IdentityError),
    #[error("session store setup failed: {0}")]
    Sessions(#[from] sqlx::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the store adapters and the services built on them.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backends: Backends,
    sessions: SessionBackend,
    identity: Arc<dyn IdentityProvider>,
    events: AuthEvents,
    catalog: CatalogView,
    checkout: CheckoutFlow,
    dashboard: AdminDashboard,
}

impl AppState {
    /// Wire services onto already-connected backends.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        backends: Backends,
        sessions: SessionBackend,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let catalog = CatalogView::new(backends.catalog.clone(), config.catalog_cache_ttl);
        let checkout = CheckoutFlow::new(backends.orders.clone());
        let dashboard = AdminDashboard::new(
            backends.catalog.clone(),
            backends.orders.clone(),
            backends.assets.clone(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                backends,
                sessions,
                identity,
                events: AuthEvents::new(),
                catalog,
                checkout,
                dashboard,
            }),
        }
    }

    /// Connect the configured backends and identity provider.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if a backend, the session store, or the identity
    /// client cannot be created.
    pub async fn from_config(config: StorefrontConfig) -> Result<Self, StateError> {
        let backends = Backends::connect(&config).await?;
        let sessions = SessionBackend::connect(&config, backends.pool.as_ref()).await?;
        let identity = identity_provider(&config.identity)?;
        Ok(Self::new(config, backends, sessions, identity))
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn backends(&self) -> &Backends {
        &self.inner.backends
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionBackend {
        &self.inner.sessions
    }

    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.inner.identity.as_ref()
    }

    #[must_use]
    pub fn events(&self) -> &AuthEvents {
        &self.inner.events
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogView {
        &self.inner.catalog
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutFlow {
        &self.inner.checkout
    }

    #[must_use]
    pub fn dashboard(&self) -> &AdminDashboard {
        &self.inner.dashboard
    }
}

/// Build the identity provider selected by configuration.
///
/// # Errors
///
/// Returns `IdentityError::Http` if the REST client cannot be built.
pub fn identity_provider(
    config: &IdentityConfig,
) -> Result<Arc<dyn IdentityProvider>, IdentityError> {
    Ok(match config {
        IdentityConfig::Rest { api_key, endpoint } => Arc::new(PasswordSignInClient::new(
            endpoint.clone(),
            api_key.clone(),
        )?),
        IdentityConfig::Local {
            email,
            password_hash,
        } => Arc::new(LocalIdentity::new(email.clone(), password_hash.clone())),
    })
}

//! Session layer and per-visitor session helpers.
//!
//! Sessions carry the visitor's bag, so they are kept on disk: the postgres
//! backend stores them in its database and every other backend in a local
//! `SQLite` file. Either way they survive a restart, and a background task
//! deletes expired records.

use std::path::Path;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::task::JoinHandle;
use tower_sessions::{ExpiredDeletion, Expiry, Session, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::{PostgresStore, SqliteStore};
use uuid::Uuid;

use crate::config::StorefrontConfig;
use crate::models::{Flash, session_keys};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "th_session";

/// Session expiry time in seconds (30 days). The bag should outlive a
/// browsing session, like browser storage would.
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// How often expired sessions are purged.
const EXPIRED_DELETION_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Durable session storage for the configured backend.
#[derive(Debug, Clone)]
pub enum SessionBackend {
    /// `tower_sessions.session` in the store database (created by migration).
    Postgres(PostgresStore),
    /// A local `SQLite` file; the table is created on connect.
    Sqlite(SqliteStore),
}

impl SessionBackend {
    /// Use the store database when there is one, otherwise the `SQLite` file
    /// named by `SESSION_DB_PATH`.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the session file cannot be opened or migrated.
    pub async fn connect(
        config: &StorefrontConfig,
        pool: Option<&PgPool>,
    ) -> Result<Self, sqlx::Error> {
        match pool {
            Some(pool) => Ok(Self::Postgres(PostgresStore::new(pool.clone()))),
            None => Self::sqlite(&config.session_db).await,
        }
    }

    /// Open (creating if needed) a `SQLite` session file.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the file cannot be opened or migrated.
    pub async fn sqlite(path: &Path) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        let store = SqliteStore::new(pool);
        store.migrate().await?;
        tracing::info!(path = %path.display(), "Using SQLite session store");
        Ok(Self::Sqlite(store))
    }

    /// Purge expired sessions every hour for as long as the server runs.
    pub fn spawn_expired_deletion(&self) -> JoinHandle<()> {
        match self.clone() {
            Self::Postgres(store) => spawn_deletion(store),
            Self::Sqlite(store) => spawn_deletion(store),
        }
    }
}

fn spawn_deletion<S: ExpiredDeletion + Clone>(store: S) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = store
            .continuously_delete_expired(EXPIRED_DELETION_INTERVAL)
            .await
        {
            tracing::error!(error = %e, "Expired session cleanup stopped");
        }
    })
}

/// Create the session layer over `store`.
#[must_use]
pub fn create_session_layer<S: SessionStore + Clone>(
    store: S,
    config: &StorefrontConfig,
) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Stable id for this visitor, created on first use.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn visitor_id(session: &Session) -> Result<String, tower_sessions::session::Error> {
    if let Some(id) = session.get::<String>(session_keys::VISITOR_ID).await? {
        return Ok(id);
    }
    let id = Uuid::new_v4().to_string();
    session.insert(session_keys::VISITOR_ID, &id).await?;
    Ok(id)
}

/// Queue a message for the next rendered page.
pub async fn set_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(session_keys::FLASH, flash).await {
        tracing::error!(error = %e, "Failed to store flash message");
    }
}

/// Take the queued message, if any. It is shown once.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session
        .remove::<Flash>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_visitor_id_is_stable() {
        let session = session();
        let first = visitor_id(&session).await.unwrap();
        let second = visitor_id(&session).await.unwrap();
        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }

    #[tokio::test]
    async fn test_flash_is_shown_once() {
        let session = session();
        set_flash(&session, Flash::success("Order Placed Successfully!")).await;

        let flash = take_flash(&session).await.unwrap();
        assert_eq!(flash.message, "Order Placed Successfully!");
        assert!(!flash.is_error());
        assert!(take_flash(&session).await.is_none());
    }

    async fn sqlite_store(path: &Path) -> SqliteStore {
        match SessionBackend::sqlite(path).await.unwrap() {
            SessionBackend::Sqlite(store) => store,
            SessionBackend::Postgres(_) => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_sqlite_sessions_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.db");

        let session = Session::new(None, Arc::new(sqlite_store(&path).await), None);
        let visitor = visitor_id(&session).await.unwrap();
        session.save().await.unwrap();
        let id = session.id().unwrap();

        let reopened = Session::new(Some(id), Arc::new(sqlite_store(&path).await), None);
        assert_eq!(visitor_id(&reopened).await.unwrap(), visitor);
    }
}

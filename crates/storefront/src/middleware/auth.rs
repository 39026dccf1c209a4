//! Admin session gate.
//!
//! Every `/admin` handler takes [`RequireAdmin`]; without a signed-in admin
//! the request is redirected to the home page before anything renders.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentAdmin, session_keys};

/// Extractor that requires a signed-in admin.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Signed in as {}", admin.email)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

/// Rejection for [`RequireAdmin`]: back to the home page.
pub struct AdminRejection;

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        Redirect::to("/").into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts.extensions.get::<Session>().ok_or(AdminRejection)?;

        let admin = current_admin(session).await.ok_or(AdminRejection)?;
        Ok(Self(admin))
    }
}

/// The signed-in admin, if any.
pub async fn current_admin(session: &Session) -> Option<CurrentAdmin> {
    session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
}

/// Store the signed-in admin in the session.
///
/// The session id is cycled first so a pre-login cookie cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Remove the admin from the session (logout). The bag is kept.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use thread_hanger_core::Email;
    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_set_and_clear_admin() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        assert!(current_admin(&session).await.is_none());

        let admin = CurrentAdmin {
            uid: "local-admin".to_owned(),
            email: Email::parse("owner@threadandhanger.pk").unwrap(),
        };
        set_current_admin(&session, &admin).await.unwrap();
        assert_eq!(current_admin(&session).await, Some(admin));

        clear_current_admin(&session).await.unwrap();
        assert!(current_admin(&session).await.is_none());
    }
}

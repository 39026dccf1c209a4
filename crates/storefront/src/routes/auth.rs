//! Admin sign-in and sign-out.
//!
//! Credentials are checked by the configured identity provider. Every
//! failure shows the same message so the form does not reveal which part
//! was wrong.

use axum::{Form, extract::State, response::Redirect};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use thread_hanger_core::Email;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::identity::{AdminIdentity, IdentityError, SessionEvent};
use crate::middleware::{RequireAdmin, clear_current_admin, set_current_admin};
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Message shown for any failed sign-in.
pub const INVALID_CREDENTIALS: &str = "Invalid Admin Credentials";

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Handle the admin login form.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect> {
    let password = SecretString::from(form.password);
    let identity = match Email::parse(&form.email) {
        Ok(email) => state.identity().sign_in(&email, &password).await,
        Err(_) => Err(IdentityError::InvalidCredentials),
    };

    match identity {
        Ok(identity) => {
            let admin = CurrentAdmin::from(identity);
            set_current_admin(&session, &admin).await?;
            set_sentry_user(&admin.uid, admin.email.as_str());
            state.events().publish(SessionEvent::SignedIn {
                uid: admin.uid,
                email: admin.email,
            });
            Ok(Redirect::to("/admin"))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Admin sign-in failed");
            session
                .insert(session_keys::LOGIN_ERROR, INVALID_CREDENTIALS)
                .await?;
            Ok(Redirect::to("/?login=open"))
        }
    }
}

/// End the admin session and return to the home page.
#[instrument(skip(state, session, admin), fields(uid = %admin.uid))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Redirect> {
    let identity = AdminIdentity::from(admin);
    if let Err(e) = state.identity().sign_out(&identity).await {
        tracing::warn!(error = %e, "Identity provider sign-out failed");
    }

    clear_current_admin(&session).await?;
    clear_sentry_user();
    state.events().publish(SessionEvent::SignedOut {
        uid: identity.uid,
        email: identity.email,
    });

    Ok(Redirect::to("/"))
}

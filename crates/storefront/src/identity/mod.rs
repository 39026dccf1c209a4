//! Admin authentication through an external identity provider.
//!
//! The storefront never stores admin accounts. It asks a provider to check an
//! email and password, keeps the returned identity in the admin's session,
//! and publishes [`SessionEvent`]s so other parts of the server can observe
//! sign-ins and sign-outs.

mod events;
mod local;
mod rest;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use thread_hanger_core::Email;

pub use events::{AuthEvents, SessionEvent, Subscription, log_session_events};
pub use local::{LocalIdentity, hash_password, verify_password};
pub use rest::PasswordSignInClient;

/// Errors from identity providers.
///
/// Callers show every variant to the user as the same generic message; the
/// detail is only logged.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Unknown email or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The provider could not be reached.
    #[error("identity provider unreachable: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with something unexpected.
    #[error("identity provider error: {0}")]
    Provider(String),

    /// Password hashing failed.
    #[error("password hashing error")]
    PasswordHash,
}

/// A signed-in admin as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    /// Provider-assigned user id.
    pub uid: String,
    pub email: Email,
}

/// Email/password identity provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Check credentials and return the admin's identity.
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AdminIdentity, IdentityError>;

    /// End the provider-side session, if the provider keeps one.
    async fn sign_out(&self, identity: &AdminIdentity) -> Result<(), IdentityError>;
}

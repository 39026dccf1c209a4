//! Session-related types.
//!
//! Types stored in the visitor's session.

use serde::{Deserialize, Serialize};

use thread_hanger_core::Email;

use crate::identity::AdminIdentity;

/// Session-stored admin identity.
///
/// Minimal data stored in the session to identify the signed-in admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Identity provider user id.
    pub uid: String,
    /// Admin's email address.
    pub email: Email,
}

impl From<AdminIdentity> for CurrentAdmin {
    fn from(identity: AdminIdentity) -> Self {
        Self {
            uid: identity.uid,
            email: identity.email,
        }
    }
}

impl From<CurrentAdmin> for AdminIdentity {
    fn from(admin: CurrentAdmin) -> Self {
        Self {
            uid: admin.uid,
            email: admin.email,
        }
    }
}

/// How a one-time message should be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.kind, FlashKind::Error)
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the signed-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the serialized bag (a JSON string).
    pub const BAG: &str = "boutique_bag";

    /// Key for the per-visitor id used to guard checkout.
    pub const VISITOR_ID: &str = "visitor_id";

    /// Key for the pending one-time message.
    pub const FLASH: &str = "flash";

    /// Key for the login form error shown on the home page.
    pub const LOGIN_ERROR: &str = "login_error";
}

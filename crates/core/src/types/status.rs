//! Order status and its transitions.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// ```text
/// pending --complete--> verified
/// ```
///
/// Deletion is not a status: the row disappears from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Awaiting admin confirmation.
    #[default]
    Pending,
    /// Fulfilled / acknowledged by an admin.
    Verified,
}

impl OrderStatus {
    /// Stored value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
        }
    }

    /// Whether a status update from `self` to `next` is allowed.
    ///
    /// Completing an already verified order is an idempotent no-op; there is
    /// no way back to pending.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending | Self::Verified, Self::Verified) | (Self::Pending, Self::Pending)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

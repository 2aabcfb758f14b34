//! Error and outcome types for the cart synchronizer.

use crate::framework::FrameworkError;
use crate::model::LineId;
use crate::services::ServiceError;
use thiserror::Error;

/// Errors surfaced to callers of cart operations.
///
/// Sync failures that were rolled back are not errors; see [`MutationOutcome`].
#[derive(Debug, Error)]
pub enum CartError {
    /// An order was submitted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// An order was submitted without a resolved customer identity.
    #[error("Not logged in")]
    NotLoggedIn,

    /// The line is not in the cart.
    #[error("Cart line not found: {0}")]
    LineNotFound(LineId),

    /// Items can only be added in positive quantities.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// The order service rejected the order.
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// The synchronizer could not be reached.
    #[error("Actor communication error: {0}")]
    Framework(#[from] FrameworkError),
}

/// How an optimistic mutation settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The server accepted the change.
    Committed,
    /// The server call failed and the cart was restored. `reason` is the failure text.
    RolledBack { reason: String },
}

impl MutationOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed)
    }
}

/// Result of a full refresh. Refresh never fails; this only reports what happened.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// The cart now mirrors the server.
    Synced { lines: usize },
    /// No credential was present, so the cart was emptied without a fetch.
    SignedOut,
    /// The fetch failed and the cart was emptied.
    Failed { reason: String },
}

//! Sync engine errors.

use thiserror::Error;

use crate::api::CartApiError;

/// Failures reported to the caller for user-facing messaging.
///
/// Access-gate rejections and vanished lines are not errors; they surface as
/// [`Outcome::Ignored`](super::Outcome::Ignored).
#[derive(Debug, Error)]
pub enum CartSyncError {
    /// The cart service could not be reached or answered unexpectedly.
    #[error("cart service unavailable")]
    Transport(#[source] CartApiError),

    /// The cart service rejected the change.
    #[error("cart change rejected: {0}")]
    Validation(String),
}

impl From<CartApiError> for CartSyncError {
    fn from(error: CartApiError) -> Self {
        match error {
            CartApiError::Validation(message) => Self::Validation(message),
            other => Self::Transport(other),
        }
    }
}

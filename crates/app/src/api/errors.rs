//! Cart API errors.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by the remote cart service.
#[derive(Debug, Error)]
pub enum CartApiError {
    /// The target line no longer exists on the server.
    #[error("cart line not found")]
    NotFound,

    /// The session is not allowed to use the cart.
    #[error("not authorised to access the cart")]
    Unauthorized,

    /// The server rejected the mutation, e.g. the quantity exceeds stock.
    #[error("rejected by cart service: {0}")]
    Validation(String),

    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server returned a non-2xx response that fits no other category.
    #[error("unexpected response from cart service: {0}")]
    UnexpectedResponse(String),
}

impl CartApiError {
    /// Classify a non-2xx response.
    pub(crate) fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized,
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                Self::Validation(body)
            }
            _ => Self::UnexpectedResponse(format!("status {status}: {body}")),
        }
    }

    /// Whether the server refused the mutation on its merits.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether the target line had already vanished.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

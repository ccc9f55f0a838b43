//! Remote cart API

use async_trait::async_trait;
use mockall::automock;
use trolley::lines::{CartLine, Quantity};

pub mod errors;
pub mod http;

pub use errors::CartApiError;
pub use http::HttpCartApi;

/// The authoritative cart store for the signed-in session.
///
/// Lines are addressed by their server id only; placeholder ids never cross this boundary.
#[automock]
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Retrieve the full cart in display order.
    async fn fetch_cart(&self) -> Result<Vec<CartLine>, CartApiError>;

    /// Add `quantity` units of a product, merging server-side with any existing line.
    async fn add_line(
        &self,
        product_id: u64,
        option_id: Option<u64>,
        quantity: Quantity,
    ) -> Result<(), CartApiError>;

    /// Replace the quantity of a line.
    async fn set_quantity(&self, line_id: u64, quantity: Quantity) -> Result<(), CartApiError>;

    /// Point a line at another option.
    async fn change_option(&self, line_id: u64, option_id: u64) -> Result<(), CartApiError>;

    /// Delete a line.
    async fn delete_line(&self, line_id: u64) -> Result<(), CartApiError>;

    /// Delete every line.
    async fn clear_cart(&self) -> Result<(), CartApiError>;
}

//! HTTP client for the storefront cart endpoints.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;
use trolley::lines::{CartLine, LineId, LineOption, Quantity};

use super::{CartApi, CartApiError};

/// `reqwest` implementation of [`CartApi`].
///
/// Session credentials are whatever the injected [`Client`] carries (a cookie store, default
/// headers); this client adds none of its own.
#[derive(Debug, Clone)]
pub struct HttpCartApi {
    base_url: String,
    http: Client,
}

impl HttpCartApi {
    /// Create a client for the API at `base_url`, e.g. `"https://shop.example.com"`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a client that sends requests through `http`.
    #[must_use]
    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self { base_url, http }
    }

    fn cart_url(&self) -> String {
        format!("{}/api/cart", self.base_url)
    }

    fn cart_path_url(&self, path: &str) -> String {
        format!("{}/api/cart/{path}", self.base_url)
    }
}

#[async_trait]
impl CartApi for HttpCartApi {
    async fn fetch_cart(&self) -> Result<Vec<CartLine>, CartApiError> {
        let response = self.http.get(self.cart_url()).send().await?;

        let parsed: CartResponse = ensure_success(response).await?.json().await?;

        debug!(items = parsed.items.len(), "fetched cart");

        Ok(parsed.items.into_iter().map(CartLine::from).collect())
    }

    async fn add_line(
        &self,
        product_id: u64,
        option_id: Option<u64>,
        quantity: Quantity,
    ) -> Result<(), CartApiError> {
        let body = AddLineRequest {
            product_id,
            option_id,
            quantity: quantity.get(),
        };

        let response = self.http.post(self.cart_url()).json(&body).send().await?;

        ensure_success(response).await?;

        Ok(())
    }

    async fn set_quantity(&self, line_id: u64, quantity: Quantity) -> Result<(), CartApiError> {
        let body = SetQuantityRequest {
            cart_id: line_id,
            quantity: quantity.get(),
        };

        let response = self
            .http
            .put(self.cart_path_url("quantity"))
            .json(&body)
            .send()
            .await?;

        ensure_success(response).await?;

        Ok(())
    }

    async fn change_option(&self, line_id: u64, option_id: u64) -> Result<(), CartApiError> {
        let body = ChangeOptionRequest {
            cart_id: line_id,
            new_option_id: option_id,
        };

        let response = self
            .http
            .put(self.cart_path_url("option"))
            .json(&body)
            .send()
            .await?;

        ensure_success(response).await?;

        Ok(())
    }

    async fn delete_line(&self, line_id: u64) -> Result<(), CartApiError> {
        let response = self
            .http
            .delete(self.cart_path_url(&line_id.to_string()))
            .send()
            .await?;

        ensure_success(response).await?;

        Ok(())
    }

    async fn clear_cart(&self) -> Result<(), CartApiError> {
        let response = self.http.delete(self.cart_url()).send().await?;

        ensure_success(response).await?;

        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, CartApiError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();

    Err(CartApiError::from_status(status, text))
}

#[derive(Debug, Deserialize)]
struct CartResponse {
    #[serde(default)]
    items: Vec<CartItemPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartItemPayload {
    cart_id: u64,
    product_id: u64,
    product_name: String,
    #[serde(default)]
    thumbnail: Option<String>,
    quantity: i64,
    price: i64,
    #[serde(default)]
    stock: u32,
    #[serde(default)]
    option: Option<OptionPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionPayload {
    option_id: u64,
    #[serde(default)]
    option_type: String,
    #[serde(default)]
    option_title: Option<String>,
    #[serde(default)]
    option_value: Option<String>,
}

impl From<CartItemPayload> for CartLine {
    fn from(item: CartItemPayload) -> Self {
        let mut line = CartLine {
            line_id: LineId::Server(item.cart_id),
            product_id: item.product_id,
            product_name: item.product_name,
            thumbnail_url: item.thumbnail.unwrap_or_default(),
            quantity: Quantity::clamped(item.quantity),
            unit_price: item.price,
            stock_available: item.stock,
            sold_out: false,
            option: item.option.map(|option| LineOption {
                option_id: option.option_id,
                option_type: option.option_type,
                option_title: option.option_title,
                option_value: option.option_value,
            }),
        };

        line.refresh_sold_out();

        line
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddLineRequest {
    product_id: u64,
    option_id: Option<u64>,
    quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SetQuantityRequest {
    cart_id: u64,
    quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangeOptionRequest {
    cart_id: u64,
    new_option_id: u64,
}

//! HTTP client for the pharmacy REST API.
//!
//! One [`ApiClient`] implements both [`CartService`] and [`OrderService`]:
//!
//! | Call | Request |
//! |---|---|
//! | `get_cart` | `GET /cart` |
//! | `add_item` | `POST /cart/items` `{productId, quantity}` |
//! | `update_item` | `PATCH /cart/items/{id}` `{quantity}` |
//! | `remove_item` | `DELETE /cart/items/{id}` |
//! | `clear_cart` | `DELETE /cart` |
//! | `create_order` | `POST /orders` |
//!
//! Requests carry `Authorization: Bearer <token>` whenever the credential store has a
//! token. No timeout is set beyond what the transport enforces.

use crate::model::wire::cart_items;
use crate::model::{LineId, OrderReceipt, PendingOrder, ProductId};
use crate::services::{CartService, CredentialStore, OrderService, ServiceError};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Client for the cart and order endpoints.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client rooted at `base_url` (e.g. `https://shop.example/api`).
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialStore>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            inner: Arc::new(ApiClientInner {
                client: reqwest::Client::new(),
                base_url,
                credentials,
            }),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.inner.base_url, path);
        let builder = self.inner.client.request(method, url);
        match self.inner.credentials.token() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Sends the request and decodes the body. An empty body decodes to `Null`.
    async fn send(&self, builder: RequestBuilder) -> Result<Value, ServiceError> {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!(
                status = %status,
                body = %text.chars().take(500).collect::<String>(),
                "Cart API returned non-success status"
            );
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: text.chars().take(200).collect(),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl CartService for ApiClient {
    #[instrument(skip(self))]
    async fn get_cart(&self) -> Result<Vec<Value>, ServiceError> {
        let body = self.send(self.request(Method::GET, "/cart")).await?;
        let items = cart_items(body);
        debug!(items = items.len(), "Fetched cart");
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn add_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<LineId, ServiceError> {
        let body = self
            .send(
                self.request(Method::POST, "/cart/items")
                    .json(&json!({ "productId": product_id, "quantity": quantity })),
            )
            .await?;

        let item = body.get("item").ok_or(ServiceError::MissingField("item"))?;
        item.get("_id")
            .or_else(|| item.get("id"))
            .and_then(Value::as_str)
            .map(LineId::from)
            .ok_or(ServiceError::MissingField("item._id"))
    }

    #[instrument(skip(self))]
    async fn update_item(&self, line_id: &LineId, quantity: u32) -> Result<(), ServiceError> {
        self.send(
            self.request(Method::PATCH, &format!("/cart/items/{}", line_id))
                .json(&json!({ "quantity": quantity })),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_item(&self, line_id: &LineId) -> Result<(), ServiceError> {
        self.send(self.request(Method::DELETE, &format!("/cart/items/{}", line_id)))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self) -> Result<(), ServiceError> {
        self.send(self.request(Method::DELETE, "/cart")).await?;
        Ok(())
    }
}

#[async_trait]
impl OrderService for ApiClient {
    #[instrument(skip(self, order), fields(customer_id = %order.customer_id, items = order.items.len()))]
    async fn create_order(&self, order: &PendingOrder) -> Result<OrderReceipt, ServiceError> {
        debug!(?order, "create_order called");
        let body = self
            .send(self.request(Method::POST, "/orders").json(order))
            .await?;
        Ok(OrderReceipt(body))
    }
}

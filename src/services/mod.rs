//! # Collaborators
//!
//! Contracts for everything the cart synchronizer talks to, and their
//! implementations.
//!
//! | Contract | Implementations |
//! |---|---|
//! | [`CartService`], [`OrderService`] | [`ApiClient`] (HTTP), [`mock`] |
//! | [`CredentialStore`] | [`MemoryCredentialStore`] |
//! | [`CartCache`] | [`FileCartCache`], [`MemoryCartCache`] |
//! | [`Notifier`] | [`TracingNotifier`], [`ChannelNotifier`] |
//!
//! Every collaborator is injected as an `Arc<dyn …>` through
//! [`CartContext`](crate::cart_actor::CartContext), so tests can swap any of them.

pub mod cache;
pub mod credentials;
pub mod error;
pub mod http;
pub mod mock;
pub mod notify;

pub use cache::*;
pub use credentials::*;
pub use error::*;
pub use http::*;
pub use notify::*;

use crate::model::{CartLine, LineId, OrderReceipt, PendingOrder, ProductId, UserIdentity};
use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::Value;

/// Remote cart service.
#[async_trait]
pub trait CartService: Send + Sync {
    /// Fetches the raw cart items. Items are mapped with
    /// [`CartLine::from_wire`](crate::model::CartLine::from_wire).
    async fn get_cart(&self) -> Result<Vec<Value>, ServiceError>;

    /// Adds `quantity` of a product and returns the id of the created line.
    async fn add_item(&self, product_id: &ProductId, quantity: u32)
        -> Result<LineId, ServiceError>;

    /// Sets the absolute quantity of a line.
    async fn update_item(&self, line_id: &LineId, quantity: u32) -> Result<(), ServiceError>;

    async fn remove_item(&self, line_id: &LineId) -> Result<(), ServiceError>;

    async fn clear_cart(&self) -> Result<(), ServiceError>;
}

/// Remote order service.
#[async_trait]
pub trait OrderService: Send + Sync {
    async fn create_order(&self, order: &PendingOrder) -> Result<OrderReceipt, ServiceError>;
}

/// Where the bearer token and the signed-in user live.
pub trait CredentialStore: Send + Sync {
    fn token(&self) -> Option<SecretString>;

    fn user(&self) -> Option<UserIdentity>;

    /// Forgets both the token and the user.
    fn clear(&self);
}

/// Local mirror of the last-known cart.
pub trait CartCache: Send + Sync {
    fn load(&self) -> Result<Option<Vec<CartLine>>, CacheError>;

    /// Replaces the stored snapshot with `lines`.
    fn store(&self, lines: &[CartLine]) -> Result<(), CacheError>;

    fn remove(&self) -> Result<(), CacheError>;
}

/// Fire-and-forget sink for user-facing messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

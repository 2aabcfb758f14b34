//! Cart lines and the observable cart state.
//!
//! The cart is owned by the [`CartSynchronizer`](crate::cart_actor::CartSynchronizer);
//! everything else sees it through a [`CartState`] published on a `watch` channel.

use crate::framework::Snapshot;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for Products.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a cart line.
///
/// A line added locally carries a `Pending` placeholder until the server answers
/// with its own id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineId {
    Pending(u64),
    Server(String),
}

impl LineId {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl From<&str> for LineId {
    fn from(id: &str) -> Self {
        Self::Server(id.to_string())
    }
}

impl From<String> for LineId {
    fn from(id: String) -> Self {
        Self::Server(id)
    }
}

impl Display for LineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending(n) => write!(f, "temp-{}", n),
            Self::Server(id) => f.write_str(id),
        }
    }
}

/// One line in the cart. `quantity` is always at least 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: LineId,
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub quantity: u32,
}

impl CartLine {
    /// Price times quantity, saturating at `Decimal::MAX`.
    pub fn total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// What a caller knows about a product when adding it to the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRef {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: String,
}

impl ProductRef {
    /// Creates a new ProductRef.
    ///
    /// # Arguments
    /// * `id` - Product identifier on the server
    /// * `name` - Display name
    /// * `price` - Unit price
    /// * `image` - Image URL or path
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Decimal,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            image: image.into(),
        }
    }
}

/// Observable cart state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CartState {
    pub lines: Vec<CartLine>,
    /// True while a full refresh is in flight.
    pub loading: bool,
    /// True while an order is being submitted.
    pub submitting: bool,
}

impl CartState {
    /// Sum of price times quantity over all lines.
    pub fn subtotal(&self) -> Decimal {
        self.lines
            .iter()
            .map(CartLine::total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Sum of quantities over all lines.
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, id: &LineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.id == id)
    }

    pub fn line_for_product(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.product_id == product_id)
    }
}

// Rollback only touches the lines; the loading and submitting flags are managed
// by the operations that own them.
impl Snapshot for CartState {
    type Saved = Vec<CartLine>;

    fn save(&self) -> Self::Saved {
        self.lines.clone()
    }

    fn restore(&mut self, saved: Self::Saved) {
        self.lines = saved;
    }
}

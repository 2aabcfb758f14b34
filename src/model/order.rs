//! Order submission payloads.
//!
//! A [`PendingOrder`] is assembled from the cart and the caller's [`OrderDetails`],
//! sent once, and discarded.

use crate::model::{CartLine, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Recipient details supplied by the caller at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub recipient_name: String,
    pub phone: String,
    pub shipping_address: String,
    pub note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

/// One ordered product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            unit_price: line.price,
        }
    }
}

/// Payload for the order-creation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOrder {
    pub customer_id: String,
    #[serde(flatten)]
    pub details: OrderDetails,
    pub items: Vec<OrderLine>,
}

impl PendingOrder {
    pub fn new(customer_id: impl Into<String>, details: OrderDetails, lines: &[CartLine]) -> Self {
        Self {
            customer_id: customer_id.into(),
            details,
            items: lines.iter().map(OrderLine::from).collect(),
        }
    }
}

/// Whatever the order service returned for a created order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReceipt(pub serde_json::Value);

impl OrderReceipt {
    /// The created order's id, when the response carries one.
    pub fn order_id(&self) -> Option<&str> {
        let body = &self.0;
        let nested = body.get("order");
        [
            body.get("_id"),
            body.get("id"),
            nested.and_then(|o| o.get("_id")),
            nested.and_then(|o| o.get("id")),
        ]
        .into_iter()
        .flatten()
        .find_map(serde_json::Value::as_str)
    }
}

//! Mapping of raw cart items returned by the cart service.
//!
//! The service answers in two shapes: denormalized (the product embedded under
//! `product`) or normalized (`productId` either populated with the product object or
//! left as a bare id string). Each field is taken from the first candidate that holds
//! a usable value, the same way a JavaScript `a || b || c` chain would: missing,
//! null, empty strings and zero all fall through.

use crate::model::{CartLine, LineId, ProductId};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Image shown when no candidate has one.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.png";

/// Extracts the item array from a cart body: `{"items": [...]}` or a bare array.
pub fn cart_items(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

impl CartLine {
    /// Maps one raw cart item, or `None` when the item is unusable.
    ///
    /// Dropped: items with neither `product` nor `productId`, items without an
    /// id, and items whose quantity is not a positive integer.
    pub fn from_wire(item: &Value) -> Option<Self> {
        let product = item.get("product").filter(|v| truthy(v));
        let product_ref = item.get("productId").filter(|v| truthy(v));
        if product.is_none() && product_ref.is_none() {
            return None;
        }
        // `productId` only carries product fields when it was populated server-side
        let populated = product_ref.filter(|v| v.is_object());

        let id = first_str([item.get("_id"), item.get("id")])?;
        let quantity = item
            .get("quantity")
            .and_then(Value::as_u64)
            .and_then(|q| u32::try_from(q).ok())
            .filter(|q| *q > 0)?;

        let product_id = first_str([
            product.and_then(|p| p.get("_id")),
            populated.and_then(|p| p.get("_id")),
            product_ref.filter(|v| v.is_string()),
        ])
        .unwrap_or_default();

        let name = first_str([
            product.and_then(|p| p.get("name")),
            populated.and_then(|p| p.get("name")),
            item.get("name"),
        ])
        .unwrap_or_default();

        let price = [
            product.and_then(|p| p.get("price")),
            populated.and_then(|p| p.get("price")),
            item.get("unitPrice"),
            item.get("price"),
        ]
        .into_iter()
        .flatten()
        .find_map(decimal)
        .unwrap_or(Decimal::ZERO);

        let image = first_str([
            product.and_then(first_image),
            populated.and_then(first_image),
            item.get("image"),
        ])
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

        Some(Self {
            id: LineId::Server(id),
            product_id: ProductId(product_id),
            name,
            price,
            image,
            quantity,
        })
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn first_str<'a>(candidates: impl IntoIterator<Item = Option<&'a Value>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn first_image(product: &Value) -> Option<&Value> {
    product.get("images")?.as_array()?.first()?.get("url")
}

fn decimal(value: &Value) -> Option<Decimal> {
    let parsed = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Decimal::from(i)),
            None => n.as_f64().and_then(Decimal::from_f64),
        },
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }?;
    (!parsed.is_zero()).then_some(parsed)
}

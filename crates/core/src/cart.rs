//! Cart state keyed by `productId_size` composite keys.
//!
//! Carts live on the client and are persisted as JSON. Two layouts exist in
//! the wild:
//!
//! ```text
//! legacy:  {"abc123": 2, "def456": 1, "count": 3}
//! current: {"items": {"abc123_M": {"productId": "abc123", "size": "M", "quantity": 2}}, "count": 2}
//! ```
//!
//! [`Cart::from_stored`] accepts either (or garbage) and always produces a
//! clean current-layout cart. Every mutation rebuilds `count` from the
//! surviving entries instead of adjusting it incrementally.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::ProductId;
use crate::stock::LineItem;

/// Key suffix used for entries without a size.
pub const NO_SIZE: &str = "no-size";

/// Product identifiers that stale clients are known to have written.
const JUNK_IDS: &[&str] = &["undefined", "null", "items", "count"];

/// Build the composite key for a product and size.
///
/// ```
/// use atelier_core::cart::composite_key;
///
/// assert_eq!(composite_key("abc123", "M"), "abc123_M");
/// assert_eq!(composite_key("abc123", ""), "abc123_no-size");
/// ```
#[must_use]
pub fn composite_key(product_id: &str, size: &str) -> String {
    let size = size.trim();
    if size.is_empty() {
        format!("{product_id}_{NO_SIZE}")
    } else {
        format!("{product_id}_{size}")
    }
}

/// Whether a client-supplied product identifier is usable.
pub(crate) fn is_valid_product_id(id: &str) -> bool {
    let id = id.trim();
    !id.is_empty() && !JUNK_IDS.contains(&id)
}

/// Errors returned by cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The product identifier is empty or a known junk value.
    #[error("Invalid product ID")]
    InvalidProductId(String),

    /// Adding a new entry would exceed the known stock.
    #[error("Cannot add {requested} items. Only {stock} in stock")]
    NewItemExceedsStock {
        /// Units requested.
        requested: u32,
        /// Units on hand.
        stock: u32,
    },

    /// Increasing an existing entry would exceed the known stock.
    #[error("Cannot add more items. Only {stock} in stock")]
    ExceedsStock {
        /// Units on hand.
        stock: u32,
    },

    /// The entry to remove is not in the cart.
    #[error("item {0} is not in the cart")]
    NotInCart(String),
}

/// What a successful mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// A new entry was created.
    Added,
    /// An existing entry's quantity changed.
    Updated,
    /// An entry dropped to zero and was removed.
    Removed,
    /// Nothing changed (e.g. a decrement on an absent entry).
    Unchanged,
}

/// One cart entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product identifier as known to the client.
    pub product_id: String,
    /// Size label, empty for unsized products.
    pub size: String,
    /// Units in the cart.
    pub quantity: u32,
}

impl CartItem {
    /// The composite key this entry is stored under.
    #[must_use]
    pub fn key(&self) -> String {
        composite_key(&self.product_id, &self.size)
    }
}

/// Client cart state.
///
/// Deserializing goes through [`Cart::from_stored`], so any persisted layout
/// can be read directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Cart {
    items: BTreeMap<String, CartItem>,
    count: u32,
}

impl From<Value> for Cart {
    fn from(value: Value) -> Self {
        Self::from_stored(&value)
    }
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from persisted JSON, migrating the legacy layout.
    ///
    /// Entries with unusable product identifiers or no quantity are dropped,
    /// entries that collapse onto the same composite key are merged, and the
    /// count is recomputed. Anything unrecognizable yields an empty cart.
    #[must_use]
    pub fn from_stored(stored: &Value) -> Self {
        let Value::Object(map) = stored else {
            return Self::new();
        };

        let mut cart = Self::new();
        match map.get("items") {
            Some(Value::Object(items)) => {
                for item in items.values() {
                    let Some(product_id) = item.get("productId").and_then(Value::as_str) else {
                        continue;
                    };
                    let size = item.get("size").and_then(Value::as_str).unwrap_or_default();
                    let quantity = item.get("quantity").map_or(0, coerce_quantity);
                    cart.merge_entry(product_id, size, quantity);
                }
            }
            Some(_) => {}
            None => {
                // Legacy layout only counts if it carries a non-zero count.
                let has_count = map
                    .get("count")
                    .and_then(Value::as_f64)
                    .is_some_and(|c| c != 0.0);
                if has_count {
                    for (product_id, quantity) in map {
                        if product_id != "count" {
                            cart.merge_entry(product_id, "", coerce_quantity(quantity));
                        }
                    }
                }
            }
        }

        cart.recount();
        cart
    }

    fn merge_entry(&mut self, product_id: &str, size: &str, quantity: u32) {
        if !is_valid_product_id(product_id) || quantity == 0 {
            return;
        }
        let product_id = product_id.trim();
        let size = size.trim();
        self.items
            .entry(composite_key(product_id, size))
            .and_modify(|item| item.quantity = item.quantity.saturating_add(quantity))
            .or_insert_with(|| CartItem {
                product_id: product_id.to_owned(),
                size: size.to_owned(),
                quantity,
            });
    }

    /// Entries by composite key.
    #[must_use]
    pub const fn items(&self) -> &BTreeMap<String, CartItem> {
        &self.items
    }

    /// Total units across all entries.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Whether the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up the entry for a product and size.
    #[must_use]
    pub fn get(&self, product_id: &str, size: &str) -> Option<&CartItem> {
        self.items.get(&composite_key(product_id, size))
    }

    /// Change the quantity of a product/size entry by `delta`.
    ///
    /// - An existing entry that drops to zero or below is removed.
    /// - Increases are checked against `stock` when it is known.
    /// - A non-positive `delta` for an absent entry does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidProductId`] for unusable identifiers and a
    /// stock error if the increase would exceed `stock`.
    pub fn add(
        &mut self,
        product_id: &str,
        delta: i32,
        size: &str,
        stock: Option<u32>,
    ) -> Result<CartChange, CartError> {
        if !is_valid_product_id(product_id) {
            return Err(CartError::InvalidProductId(product_id.to_owned()));
        }
        let product_id = product_id.trim();
        let size = size.trim();
        let key = composite_key(product_id, size);

        let change = if let Some(current) = self.items.get_mut(&key) {
            let next = i64::from(current.quantity) + i64::from(delta);
            if next <= 0 {
                self.items.remove(&key);
                CartChange::Removed
            } else {
                let next = u32::try_from(next).unwrap_or(u32::MAX);
                if let Some(stock) = stock
                    && delta > 0
                    && next > stock
                {
                    return Err(CartError::ExceedsStock { stock });
                }
                current.quantity = next;
                CartChange::Updated
            }
        } else {
            let Ok(requested) = u32::try_from(delta) else {
                return Ok(CartChange::Unchanged);
            };
            if requested == 0 {
                return Ok(CartChange::Unchanged);
            }
            if let Some(stock) = stock
                && requested > stock
            {
                return Err(CartError::NewItemExceedsStock { requested, stock });
            }
            self.items.insert(
                key,
                CartItem {
                    product_id: product_id.to_owned(),
                    size: size.to_owned(),
                    quantity: requested,
                },
            );
            CartChange::Added
        };

        self.recount();
        Ok(change)
    }

    /// Remove a product/size entry entirely.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidProductId`] for unusable identifiers and
    /// [`CartError::NotInCart`] if there is no such entry.
    pub fn remove(&mut self, product_id: &str, size: &str) -> Result<CartItem, CartError> {
        if !is_valid_product_id(product_id) {
            return Err(CartError::InvalidProductId(product_id.to_owned()));
        }
        let key = composite_key(product_id.trim(), size);
        let removed = self
            .items
            .remove(&key)
            .ok_or(CartError::NotInCart(key))?;
        self.recount();
        Ok(removed)
    }

    /// Empty the cart.
    pub fn reset(&mut self) {
        self.items.clear();
        self.recount();
    }

    /// Convert the cart into order line items.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidProductId`] if an entry's identifier is not
    /// a server product ID.
    pub fn line_items(&self) -> Result<Vec<LineItem>, CartError> {
        self.items
            .values()
            .map(|item| {
                let product_id = item
                    .product_id
                    .parse::<ProductId>()
                    .map_err(|_| CartError::InvalidProductId(item.product_id.clone()))?;
                Ok(LineItem::new(product_id, item.quantity, Some(&item.size)))
            })
            .collect()
    }

    fn recount(&mut self) {
        self.count = self
            .items
            .values()
            .fold(0_u32, |sum, item| sum.saturating_add(item.quantity));
    }
}

/// Lenient quantity coercion for persisted values.
///
/// Accepts JSON numbers and numeric strings, truncating fractions. Anything
/// else, including negatives, counts as zero.
fn coerce_quantity(value: &Value) -> u32 {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(truncate)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(truncate))
        }
        _ => None,
    };
    parsed
        .and_then(|q| u32::try_from(q).ok())
        .unwrap_or_default()
}

#[allow(clippy::cast_possible_truncation)] // bounded by the u32 conversion that follows
fn truncate(value: f64) -> i64 {
    if value.is_finite() { value.trunc() as i64 } else { 0 }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_migrates_legacy_layout() {
        let cart = Cart::from_stored(&json!({"abc123": 2, "count": 2}));

        assert_eq!(cart.count(), 2);
        assert_eq!(
            serde_json::to_value(&cart).unwrap(),
            json!({
                "items": {
                    "abc123_no-size": {"productId": "abc123", "size": "", "quantity": 2}
                },
                "count": 2
            })
        );
    }

    #[test]
    fn test_legacy_layout_drops_junk_keys() {
        let cart = Cart::from_stored(&json!({
            "abc": 1, "undefined": 4, "": 2, "  ": 3, "def": "2", "count": 10
        }));
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.count(), 3);
    }

    #[test]
    fn test_legacy_layout_without_count_is_empty() {
        let cart = Cart::from_stored(&json!({"abc": 1, "count": 0}));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_current_layout_is_cleaned_and_recounted() {
        let cart = Cart::from_stored(&json!({
            "items": {
                "a_M": {"productId": "a", "size": "M", "quantity": "3"},
                "bad": {"productId": "undefined", "size": "", "quantity": 1},
                "items": {"productId": "items", "quantity": 1},
                "nope": {"size": "L", "quantity": 1},
                "b_no-size": {"productId": "b", "quantity": 2.7}
            },
            "count": 999
        }));

        assert_eq!(cart.count(), 5);
        assert_eq!(cart.get("a", "M").unwrap().quantity, 3);
        assert_eq!(cart.get("b", "").unwrap().quantity, 2);
        assert!(cart.get("undefined", "").is_none());
    }

    #[test]
    fn test_current_layout_merges_colliding_keys() {
        let cart = Cart::from_stored(&json!({
            "items": {
                "x1": {"productId": "p", "size": "M", "quantity": 1},
                "x2": {"productId": "p", "size": " M ", "quantity": 2}
            }
        }));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.count(), 3);
    }

    #[test]
    fn test_garbage_yields_empty_cart() {
        for stored in [json!(null), json!([1, 2]), json!("cart"), json!({"items": 3})] {
            assert_eq!(Cart::from_stored(&stored), Cart::new());
        }
    }

    #[test]
    fn test_deserialize_runs_reconciler() {
        let cart: Cart = serde_json::from_str(r#"{"abc123": 2, "count": 2}"#).unwrap();
        assert_eq!(cart.get("abc123", "").unwrap().quantity, 2);
    }

    #[test]
    fn test_add_new_and_existing() {
        let mut cart = Cart::new();
        assert_eq!(cart.add("p1", 2, "M", None), Ok(CartChange::Added));
        assert_eq!(cart.add("p1", 1, "M", None), Ok(CartChange::Updated));
        assert_eq!(cart.add("p1", 1, "L", None), Ok(CartChange::Added));
        assert_eq!(cart.count(), 4);
        assert_eq!(cart.items().len(), 2);
    }

    #[test]
    fn test_decrement_to_zero_removes() {
        let mut cart = Cart::new();
        cart.add("p1", 1, "", None).unwrap();
        assert_eq!(cart.add("p1", -1, "", None), Ok(CartChange::Removed));
        assert!(cart.is_empty());
        assert_eq!(cart.count(), 0);
    }

    #[test]
    fn test_non_positive_delta_for_absent_entry_is_noop() {
        let mut cart = Cart::new();
        assert_eq!(cart.add("p1", -1, "", None), Ok(CartChange::Unchanged));
        assert_eq!(cart.add("p1", 0, "", None), Ok(CartChange::Unchanged));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_stock_limits() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.add("p1", 3, "M", Some(2)),
            Err(CartError::NewItemExceedsStock {
                requested: 3,
                stock: 2
            })
        );
        cart.add("p1", 2, "M", Some(2)).unwrap();
        let err = cart.add("p1", 1, "M", Some(2)).unwrap_err();
        assert_eq!(err.to_string(), "Cannot add more items. Only 2 in stock");
        // Decreasing is always allowed.
        assert_eq!(cart.add("p1", -1, "M", Some(0)), Ok(CartChange::Updated));
        assert_eq!(cart.count(), 1);
    }

    #[test]
    fn test_invalid_product_ids_rejected() {
        let mut cart = Cart::new();
        for id in ["", "  ", "undefined", "items"] {
            assert!(matches!(
                cart.add(id, 1, "", None),
                Err(CartError::InvalidProductId(_))
            ));
        }
    }

    #[test]
    fn test_remove_and_reset() {
        let mut cart = Cart::new();
        cart.add("p1", 2, "M", None).unwrap();
        cart.add("p2", 1, "", None).unwrap();

        let removed = cart.remove("p1", "M").unwrap();
        assert_eq!(removed.quantity, 2);
        assert_eq!(cart.count(), 1);
        assert!(matches!(cart.remove("p1", "M"), Err(CartError::NotInCart(_))));

        cart.reset();
        assert!(cart.is_empty());
        assert_eq!(cart.count(), 0);
    }

    #[test]
    fn test_line_items() {
        let mut cart = Cart::new();
        cart.add("7", 2, "M", None).unwrap();
        cart.add("9", 1, "", None).unwrap();

        let lines = cart.line_items().unwrap();
        assert_eq!(
            lines,
            vec![
                LineItem::new(ProductId::new(7), 2, Some("M")),
                LineItem::new(ProductId::new(9), 1, None),
            ]
        );

        cart.add("abc123", 1, "", None).unwrap();
        assert!(matches!(cart.line_items(), Err(CartError::InvalidProductId(_))));
    }
}

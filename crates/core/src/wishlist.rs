//! Client wishlist, persisted as `{"<productId>": true, ...}`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::cart::is_valid_product_id;

/// A set of wished-for product identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct Wishlist(BTreeSet<String>);

impl From<Value> for Wishlist {
    fn from(value: Value) -> Self {
        Self::from_stored(&value)
    }
}

impl Serialize for Wishlist {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|id| (id, true)))
    }
}

impl Wishlist {
    /// An empty wishlist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted JSON, keeping only usable IDs with a truthy flag.
    #[must_use]
    pub fn from_stored(stored: &Value) -> Self {
        let Value::Object(map) = stored else {
            return Self::new();
        };
        Self(
            map.iter()
                .filter(|(id, flag)| is_valid_product_id(id) && is_truthy(flag))
                .map(|(id, _)| id.trim().to_owned())
                .collect(),
        )
    }

    /// Add a product. Returns `false` if it was already present or invalid.
    pub fn add(&mut self, product_id: &str) -> bool {
        is_valid_product_id(product_id) && self.0.insert(product_id.trim().to_owned())
    }

    /// Remove a product. Returns whether it was present.
    pub fn remove(&mut self, product_id: &str) -> bool {
        self.0.remove(product_id.trim())
    }

    /// Flip membership. Returns `true` if the product is now wished for.
    pub fn toggle(&mut self, product_id: &str) -> bool {
        if self.remove(product_id) {
            false
        } else {
            self.add(product_id)
        }
    }

    #[must_use]
    pub fn contains(&self, product_id: &str) -> bool {
        self.0.contains(product_id.trim())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wished-for IDs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_toggle() {
        let mut wishlist = Wishlist::new();
        assert!(wishlist.toggle("p1"));
        assert!(wishlist.contains("p1"));
        assert!(!wishlist.toggle("p1"));
        assert!(!wishlist.contains("p1"));
    }

    #[test]
    fn test_add_rejects_junk_and_duplicates() {
        let mut wishlist = Wishlist::new();
        assert!(wishlist.add("p1"));
        assert!(!wishlist.add("p1"));
        assert!(!wishlist.add("undefined"));
        assert!(!wishlist.add(" "));
        assert_eq!(wishlist.len(), 1);
    }

    #[test]
    fn test_from_stored_filters() {
        let wishlist = Wishlist::from_stored(&json!({
            "a": true, "b": false, "undefined": true, "": true, "c": 1
        }));
        assert_eq!(wishlist.iter().collect::<Vec<_>>(), vec!["a", "c"]);
        assert!(Wishlist::from_stored(&json!([1, 2])).is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let mut wishlist = Wishlist::new();
        wishlist.add("b");
        wishlist.add("a");
        assert_eq!(
            serde_json::to_value(&wishlist).unwrap(),
            json!({"a": true, "b": true})
        );
        let back: Wishlist = serde_json::from_value(json!({"a": true, "b": true})).unwrap();
        assert_eq!(back, wishlist);
    }
}

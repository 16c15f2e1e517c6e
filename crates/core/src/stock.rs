//! Stock models and the all-or-nothing stock reservation planner.
//!
//! A product tracks stock in exactly one of two ways:
//!
//! - **Sized**: a non-empty list of `{size, stock}` entries, one counter per size.
//! - **Flat**: a single aggregate counter, used when the product has no sizes.
//!
//! [`reserve`] admits an order only if every line item can be served. Lines
//! that name the same product and stock counter are summed before checking,
//! and nothing is decremented unless the whole order fits.
//!
//! The planner is pure. The server runs it against rows it has locked with
//! `SELECT ... FOR UPDATE` inside the order transaction, which is what makes
//! validation and decrement atomic with respect to concurrent orders.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ProductId;

/// Stock held for one size of a sized product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeStock {
    /// Size label as shown to customers (e.g. "M", "XL", "42").
    pub size: String,
    /// Units available in this size.
    pub stock: i32,
}

impl SizeStock {
    /// Create a size entry.
    #[must_use]
    pub fn new(size: impl Into<String>, stock: i32) -> Self {
        Self {
            size: size.into(),
            stock,
        }
    }
}

/// Stock snapshot of a single product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductStock {
    /// Product being tracked.
    pub id: ProductId,
    /// Product title, used in error messages.
    pub title: String,
    /// Per-size stock. Empty for flat-stock products.
    pub sizes: Vec<SizeStock>,
    /// Flat stock counter.
    pub stock: i32,
}

impl ProductStock {
    /// Snapshot of a flat-stock product.
    #[must_use]
    pub fn flat(id: ProductId, title: impl Into<String>, stock: i32) -> Self {
        Self {
            id,
            title: title.into(),
            sizes: Vec::new(),
            stock,
        }
    }

    /// Snapshot of a sized product.
    #[must_use]
    pub fn sized(id: ProductId, title: impl Into<String>, sizes: Vec<SizeStock>) -> Self {
        Self {
            id,
            title: title.into(),
            sizes,
            stock: 0,
        }
    }

    /// Whether the product tracks stock per size.
    #[must_use]
    pub const fn is_sized(&self) -> bool {
        !self.sizes.is_empty()
    }

    /// Resolve which counter an order line draws from.
    ///
    /// A requested size is only honored on sized products; every other
    /// combination draws from the flat counter.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::UnknownSize`] if the product is sized and does not
    /// carry the requested size.
    pub fn target_for(&self, size: Option<&str>) -> Result<StockTarget, StockError> {
        match size {
            Some(size) if self.is_sized() => {
                if self.sizes.iter().any(|s| s.size == size) {
                    Ok(StockTarget::Size(size.to_owned()))
                } else {
                    Err(StockError::UnknownSize {
                        product: self.title.clone(),
                        size: size.to_owned(),
                    })
                }
            }
            _ => Ok(StockTarget::Flat),
        }
    }

    /// Units available on a counter. Unknown sizes have nothing available.
    #[must_use]
    pub fn available(&self, target: &StockTarget) -> i32 {
        match target {
            StockTarget::Flat => self.stock,
            StockTarget::Size(size) => self
                .sizes
                .iter()
                .find(|s| &s.size == size)
                .map_or(0, |s| s.stock),
        }
    }

    fn take(&mut self, target: &StockTarget, quantity: i32) -> i32 {
        match target {
            StockTarget::Flat => {
                self.stock -= quantity;
                self.stock
            }
            StockTarget::Size(size) => self
                .sizes
                .iter_mut()
                .find(|s| &s.size == size)
                .map_or(0, |s| {
                    s.stock -= quantity;
                    s.stock
                }),
        }
    }
}

/// The stock counter a line item draws from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StockTarget {
    /// The product's flat stock counter.
    Flat,
    /// The counter for one size.
    Size(String),
}

impl StockTarget {
    /// The size label, if this is a per-size counter.
    #[must_use]
    pub fn size(&self) -> Option<&str> {
        match self {
            Self::Flat => None,
            Self::Size(size) => Some(size),
        }
    }
}

/// One entry in an order's product list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product being ordered.
    pub product_id: ProductId,
    /// Units ordered. Must be at least one.
    pub quantity: u32,
    /// Requested size, if any.
    #[serde(default, deserialize_with = "deserialize_size")]
    pub size: Option<String>,
}

impl LineItem {
    /// Create a line item. Blank sizes are treated as "no size".
    #[must_use]
    pub fn new(product_id: ProductId, quantity: u32, size: Option<&str>) -> Self {
        Self {
            product_id,
            quantity,
            size: normalize_size(size),
        }
    }
}

fn normalize_size(size: Option<&str>) -> Option<String> {
    size.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn deserialize_size<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(normalize_size(raw.as_deref()))
}

/// A planned decrement of one stock counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDecrement {
    /// Product whose stock is decremented.
    pub product_id: ProductId,
    /// Counter being decremented.
    pub target: StockTarget,
    /// Units removed (sum of all lines drawing from this counter).
    pub quantity: i32,
    /// Units left on the counter afterwards.
    pub remaining: i32,
}

/// Reasons an order cannot be admitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    /// The order has no line items.
    #[error("order must contain at least one product")]
    EmptyOrder,

    /// A line item asks for zero units (or more than can be represented).
    #[error("invalid quantity for product {product_id}")]
    InvalidQuantity {
        /// Offending product.
        product_id: ProductId,
    },

    /// A line item names a product that does not exist.
    #[error("product {product_id} not found")]
    ProductNotFound {
        /// Missing product.
        product_id: ProductId,
    },

    /// A sized product does not carry the requested size.
    #[error("size {size} is not available for {product}")]
    UnknownSize {
        /// Product title.
        product: String,
        /// Requested size.
        size: String,
    },

    /// Not enough units on hand.
    #[error("{}", insufficient_message(.product, .size, .requested, .available))]
    Insufficient {
        /// Product title.
        product: String,
        /// Size, for sized products.
        size: Option<String>,
        /// Units requested across all lines for this counter.
        requested: i32,
        /// Units on hand.
        available: i32,
    },
}

impl StockError {
    /// How many units short the request is, for stock shortfalls.
    #[must_use]
    pub const fn shortfall(&self) -> Option<i32> {
        match self {
            Self::Insufficient {
                requested,
                available,
                ..
            } => Some(*requested - *available),
            _ => None,
        }
    }
}

fn insufficient_message(
    product: &str,
    size: &Option<String>,
    requested: &i32,
    available: &i32,
) -> String {
    let available = (*available).max(0);
    let short = requested - available;
    match size {
        Some(size) => format!(
            "Insufficient stock for {product} (size {size}): requested {requested}, only {available} available ({short} short)"
        ),
        None => format!(
            "Insufficient stock for {product}: requested {requested}, only {available} available ({short} short)"
        ),
    }
}

/// Validate an order against stock snapshots and apply it, all or nothing.
///
/// Checking runs in two passes. Every line is first resolved against its
/// product (quantity, product, size) and the first malformed line is
/// returned. Repeated lines are then summed per counter and compared with
/// stock in the order each counter first appears, returning the first
/// shortfall. So a malformed line anywhere in the request is reported ahead
/// of a shortfall on an earlier line.
///
/// On success every counter in `products` has been decremented and the
/// applied decrements are returned sorted by product ID (the order in which
/// the server writes them back). On failure `products` is left untouched.
///
/// # Errors
///
/// Returns a [`StockError`] if the order is empty, a quantity is zero, a
/// product or size is unknown, or any counter would go below zero.
pub fn reserve(
    products: &mut BTreeMap<ProductId, ProductStock>,
    lines: &[LineItem],
) -> Result<Vec<StockDecrement>, StockError> {
    let demand = plan(products, lines)?;

    let mut applied = Vec::with_capacity(demand.len());
    for ((product_id, target), quantity) in demand {
        let remaining = products
            .get_mut(&product_id)
            .map_or(0, |product| product.take(&target, quantity));
        applied.push(StockDecrement {
            product_id,
            target,
            quantity,
            remaining,
        });
    }

    Ok(applied)
}

/// Resolve and aggregate demand, checking it against the snapshots.
fn plan(
    products: &BTreeMap<ProductId, ProductStock>,
    lines: &[LineItem],
) -> Result<BTreeMap<(ProductId, StockTarget), i32>, StockError> {
    if lines.is_empty() {
        return Err(StockError::EmptyOrder);
    }

    let mut demand: BTreeMap<(ProductId, StockTarget), i32> = BTreeMap::new();
    // First-seen order of counters so errors follow the request order.
    let mut seen: Vec<(ProductId, StockTarget)> = Vec::new();

    for line in lines {
        let quantity = i32::try_from(line.quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or(StockError::InvalidQuantity {
                product_id: line.product_id,
            })?;

        let product = products
            .get(&line.product_id)
            .ok_or(StockError::ProductNotFound {
                product_id: line.product_id,
            })?;

        let key = (product.id, product.target_for(line.size.as_deref())?);
        let total = demand.entry(key.clone()).or_insert(0);
        if *total == 0 {
            seen.push(key);
        }
        *total = total.checked_add(quantity).ok_or(StockError::InvalidQuantity {
            product_id: line.product_id,
        })?;
    }

    for key in &seen {
        let (product_id, target) = key;
        let requested = demand.get(key).copied().unwrap_or_default();
        let Some(product) = products.get(product_id) else {
            return Err(StockError::ProductNotFound {
                product_id: *product_id,
            });
        };
        let available = product.available(target);
        if requested > available {
            return Err(StockError::Insufficient {
                product: product.title.clone(),
                size: target.size().map(str::to_owned),
                requested,
                available,
            });
        }
    }

    Ok(demand)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn pid(id: i32) -> ProductId {
        ProductId::new(id)
    }

    fn catalog(products: Vec<ProductStock>) -> BTreeMap<ProductId, ProductStock> {
        products.into_iter().map(|p| (p.id, p)).collect()
    }

    fn shirt() -> ProductStock {
        ProductStock::sized(
            pid(1),
            "Linen Shirt",
            vec![SizeStock::new("M", 2), SizeStock::new("L", 5)],
        )
    }

    fn mug() -> ProductStock {
        ProductStock::flat(pid(2), "Clay Mug", 5)
    }

    #[test]
    fn test_sized_shortfall_is_rejected_and_stock_untouched() {
        let mut products = catalog(vec![shirt()]);
        let before = products.clone();

        let err = reserve(&mut products, &[LineItem::new(pid(1), 3, Some("M"))]).unwrap_err();

        assert_eq!(
            err,
            StockError::Insufficient {
                product: "Linen Shirt".to_owned(),
                size: Some("M".to_owned()),
                requested: 3,
                available: 2,
            }
        );
        assert_eq!(err.shortfall(), Some(1));
        assert!(err.to_string().contains("Linen Shirt"));
        assert!(err.to_string().contains("1 short"));
        assert_eq!(products, before);
    }

    #[test]
    fn test_valid_order_decrements_exact_quantities() {
        let mut products = catalog(vec![shirt(), mug()]);

        let applied = reserve(
            &mut products,
            &[
                LineItem::new(pid(1), 2, Some("L")),
                LineItem::new(pid(2), 4, None),
            ],
        )
        .unwrap();

        assert_eq!(applied.len(), 2);
        assert_eq!(products[&pid(1)].available(&StockTarget::Size("L".into())), 3);
        assert_eq!(products[&pid(1)].available(&StockTarget::Size("M".into())), 2);
        assert_eq!(products[&pid(2)].stock, 1);
        assert_eq!(applied[1].remaining, 1);
    }

    #[test]
    fn test_one_bad_line_rejects_whole_order() {
        let mut products = catalog(vec![shirt(), mug()]);
        let before = products.clone();

        let result = reserve(
            &mut products,
            &[
                LineItem::new(pid(2), 1, None),
                LineItem::new(pid(1), 9, Some("L")),
            ],
        );

        assert!(matches!(result, Err(StockError::Insufficient { .. })));
        assert_eq!(products, before);
    }

    #[test]
    fn test_repeated_lines_are_summed() {
        let mut products = catalog(vec![ProductStock::flat(pid(2), "Clay Mug", 3)]);

        let err = reserve(
            &mut products,
            &[LineItem::new(pid(2), 2, None), LineItem::new(pid(2), 2, None)],
        )
        .unwrap_err();

        assert!(matches!(
            err,
            StockError::Insufficient {
                requested: 4,
                available: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_sequential_orders_cannot_oversell() {
        let mut products = catalog(vec![mug()]);
        let order = [LineItem::new(pid(2), 4, None)];

        assert!(reserve(&mut products, &order).is_ok());
        assert!(reserve(&mut products, &order).is_err());
        assert_eq!(products[&pid(2)].stock, 1);
    }

    #[test]
    fn test_unknown_size_on_sized_product() {
        let mut products = catalog(vec![shirt()]);
        let err = reserve(&mut products, &[LineItem::new(pid(1), 1, Some("XS"))]).unwrap_err();
        assert!(matches!(err, StockError::UnknownSize { ref size, .. } if size == "XS"));
    }

    #[test]
    fn test_size_on_flat_product_uses_flat_counter() {
        let mut products = catalog(vec![mug()]);
        let applied = reserve(&mut products, &[LineItem::new(pid(2), 1, Some("M"))]).unwrap();
        assert_eq!(applied[0].target, StockTarget::Flat);
        assert_eq!(products[&pid(2)].stock, 4);
    }

    #[test]
    fn test_missing_size_on_sized_product_uses_flat_counter() {
        let mut products = catalog(vec![shirt()]);
        let err = reserve(&mut products, &[LineItem::new(pid(1), 1, None)]).unwrap_err();
        assert!(matches!(
            err,
            StockError::Insufficient {
                size: None,
                available: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_order_and_zero_quantity() {
        let mut products = catalog(vec![mug()]);
        assert_eq!(reserve(&mut products, &[]), Err(StockError::EmptyOrder));
        assert_eq!(
            reserve(&mut products, &[LineItem::new(pid(2), 0, None)]),
            Err(StockError::InvalidQuantity { product_id: pid(2) })
        );
    }

    #[test]
    fn test_missing_product() {
        let mut products = catalog(vec![mug()]);
        assert_eq!(
            reserve(&mut products, &[LineItem::new(pid(99), 1, None)]),
            Err(StockError::ProductNotFound { product_id: pid(99) })
        );
    }

    #[test]
    fn test_decrements_are_sorted_by_product() {
        let mut products = catalog(vec![shirt(), mug()]);
        let applied = reserve(
            &mut products,
            &[
                LineItem::new(pid(2), 1, None),
                LineItem::new(pid(1), 1, Some("M")),
            ],
        )
        .unwrap();
        let ids: Vec<_> = applied.iter().map(|d| d.product_id).collect();
        assert_eq!(ids, vec![pid(1), pid(2)]);
    }

    #[test]
    fn test_line_item_blank_size_is_none() {
        let line: LineItem =
            serde_json::from_str(r#"{"productId": 4, "quantity": 1, "size": "  "}"#).unwrap();
        assert_eq!(line.size, None);
        assert_eq!(LineItem::new(pid(4), 1, Some("")).size, None);
    }

    #[test]
    fn test_malformed_line_is_reported_before_earlier_shortfall() {
        let mut products = catalog(vec![mug(), shirt()]);
        let before = products.clone();

        let err = reserve(
            &mut products,
            &[
                LineItem::new(pid(2), 6, None),
                LineItem::new(pid(1), 1, Some("XS")),
            ],
        )
        .unwrap_err();

        assert_eq!(
            err,
            StockError::UnknownSize {
                product: "Linen Shirt".to_owned(),
                size: "XS".to_owned(),
            }
        );
        assert_eq!(err.shortfall(), None);
        assert_eq!(products, before);
    }

    #[test]
    fn test_first_short_counter_in_request_order_is_reported() {
        let mut products = catalog(vec![shirt(), mug()]);

        let err = reserve(
            &mut products,
            &[
                LineItem::new(pid(2), 9, None),
                LineItem::new(pid(1), 3, Some("M")),
            ],
        )
        .unwrap_err();

        assert!(matches!(
            err,
            StockError::Insufficient { ref product, .. } if product == "Clay Mug"
        ));
        assert_eq!(err.shortfall(), Some(4));
    }
}

//! Product domain types and request/response bodies.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use atelier_core::stock::{ProductStock, SizeStock};
use atelier_core::{Money, ProductId};

use super::image;

/// A catalog product with its images and size breakdown.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub category: String,
    pub title: String,
    pub price: Money,
    /// Raw image bytes in display order.
    pub images: Vec<Vec<u8>>,
    pub description: String,
    pub design_details: String,
    /// Per-size stock; empty for products tracked by `stock` alone.
    pub sizes: Vec<SizeStock>,
    /// Flat stock counter.
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Snapshot of the stock counters for order validation.
    #[must_use]
    pub fn stock_snapshot(&self) -> ProductStock {
        ProductStock {
            id: self.id,
            title: self.title.clone(),
            sizes: self.sizes.clone(),
            stock: self.stock,
        }
    }
}

/// Product as returned by the API, images encoded as `data:` URLs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: ProductId,
    pub category: String,
    pub title: String,
    pub price: Money,
    pub images: Vec<String>,
    pub description: String,
    pub design_details: String,
    pub sizes: Vec<SizeStock>,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            category: product.category.clone(),
            title: product.title.clone(),
            price: product.price,
            images: product.images.iter().map(|i| image::to_data_url(i)).collect(),
            description: product.description.clone(),
            design_details: product.design_details.clone(),
            sizes: product.sizes.clone(),
            stock: product.stock,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self::from(&product)
    }
}

/// Body of the create and edit endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub category: String,
    pub title: String,
    pub price: Money,
    pub description: String,
    #[serde(alias = "design_details")]
    pub design_details: String,
    #[serde(default)]
    pub sizes: Vec<SizeStock>,
    #[serde(default)]
    pub stock: i32,
    /// New images as `data:` URLs or bare base64.
    #[serde(default)]
    pub images: Vec<String>,
    /// Feature the product on the homepage.
    #[serde(default)]
    pub homepage: bool,
    /// Edit only: positions of existing images to keep, in the new order.
    #[serde(default)]
    pub kept_image_indexes: Vec<usize>,
}

/// Validated product fields ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub category: String,
    pub title: String,
    pub price: Money,
    pub description: String,
    pub design_details: String,
    pub sizes: Vec<SizeStock>,
    pub stock: i32,
    pub images: Vec<Vec<u8>>,
}

impl ProductInput {
    /// Validate the body and decode its images.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message describing the first problem found.
    pub fn into_draft(self) -> Result<ProductDraft, String> {
        let category = required("category", &self.category)?;
        let title = required("title", &self.title)?;
        let description = required("description", &self.description)?;
        let design_details = required("design details", &self.design_details)?;

        if self.price.is_negative() {
            return Err("Price must be a non-negative number".to_string());
        }
        if self.stock < 0 {
            return Err("Stock must be a non-negative number".to_string());
        }

        let mut seen = HashSet::new();
        let mut sizes = Vec::with_capacity(self.sizes.len());
        for entry in self.sizes {
            let size = entry.size.trim();
            if size.is_empty() {
                return Err("Size labels cannot be empty".to_string());
            }
            if entry.stock < 0 {
                return Err(format!("Stock for size {size} must be non-negative"));
            }
            if !seen.insert(size.to_string()) {
                return Err(format!("Size {size} is listed more than once"));
            }
            sizes.push(SizeStock::new(size, entry.stock));
        }

        let images = self
            .images
            .iter()
            .map(|raw| image::decode(raw).map_err(|e| e.to_string()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ProductDraft {
            category,
            title,
            price: self.price,
            description,
            design_details,
            sizes,
            stock: self.stock,
            images,
        })
    }
}

fn required(field: &str, value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        Err(format!("The {field} field is required"))
    } else {
        Ok(value.to_string())
    }
}

/// Body of `POST /api/products/ids`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductIds {
    #[serde(default)]
    pub ids: Vec<ProductId>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;

    fn input(body: serde_json::Value) -> ProductInput {
        serde_json::from_value(body).unwrap()
    }

    fn base() -> serde_json::Value {
        json!({
            "category": "Shirts",
            "title": "  Linen Shirt ",
            "price": "4500.00",
            "description": "Hand loomed",
            "design_details": "Mother of pearl buttons",
            "sizes": [{"size": "M", "stock": 2}, {"size": " L ", "stock": 5}]
        })
    }

    #[test]
    fn test_into_draft_trims_and_decodes() {
        let mut body = base();
        body["images"] = json!(["data:image/png;base64,iVBORw0KGgo="]);
        let draft = input(body).into_draft().unwrap();

        assert_eq!(draft.title, "Linen Shirt");
        assert_eq!(draft.sizes[1], SizeStock::new("L", 5));
        assert_eq!(draft.images.len(), 1);
        assert_eq!(draft.stock, 0);
    }

    #[test]
    fn test_accepts_camel_case_design_details() {
        let mut body = base();
        body.as_object_mut().unwrap().remove("design_details");
        body["designDetails"] = json!("Hidden placket");
        assert_eq!(input(body).into_draft().unwrap().design_details, "Hidden placket");
    }

    #[test]
    fn test_rejects_missing_fields_and_bad_sizes() {
        let mut body = base();
        body["title"] = json!("   ");
        assert!(input(body).into_draft().unwrap_err().contains("title"));

        let mut body = base();
        body["sizes"] = json!([{"size": "M", "stock": 1}, {"size": "M", "stock": 2}]);
        assert!(input(body).into_draft().is_err());

        let mut body = base();
        body["sizes"] = json!([{"size": "M", "stock": -1}]);
        assert!(input(body).into_draft().is_err());

        let mut body = base();
        body["price"] = json!(-1);
        assert!(input(body).into_draft().is_err());
    }

    #[test]
    fn test_view_encodes_images() {
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(3),
            category: "Mugs".to_string(),
            title: "Clay Mug".to_string(),
            price: Money::from_units(1200),
            images: vec![vec![0xFF, 0xD8, 0xFF, 0xE0]],
            description: "Glazed".to_string(),
            design_details: "Wheel thrown".to_string(),
            sizes: vec![],
            stock: 5,
            created_at: now,
            updated_at: now,
        };

        let view = serde_json::to_value(ProductView::from(&product)).unwrap();
        assert_eq!(view["id"], 3);
        assert_eq!(view["price"], "1200");
        assert_eq!(view["designDetails"], "Wheel thrown");
        assert!(view["images"][0].as_str().unwrap().starts_with("data:image/jpeg;base64,"));

        let snapshot = product.stock_snapshot();
        assert!(!snapshot.is_sized());
        assert_eq!(snapshot.stock, 5);
    }
}

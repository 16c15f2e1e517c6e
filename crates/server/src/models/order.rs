//! Order types: checkout request, stored order and admin views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use atelier_core::stock::LineItem;
use atelier_core::{Email, Money, OrderId, OrderStatus, ProductId};

use super::image;

/// Name shown for order lines whose product has since been deleted.
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// Body of `POST /api/orders/create`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub additional_info: String,
    #[serde(default)]
    pub products: Vec<LineItem>,
    /// Client-computed total. Only compared against the server total.
    #[serde(default)]
    pub total_amount: Option<Money>,
}

/// Validated delivery contact for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub address: String,
    pub phone: String,
    pub email: Email,
    pub additional_info: String,
}

impl CheckoutRequest {
    /// Validate the contact fields.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message naming the first missing or invalid
    /// field.
    pub fn customer(&self) -> Result<Customer, String> {
        let field = |name: &str, value: &str| {
            let value = value.trim();
            if value.is_empty() {
                Err(format!("{name} is required"))
            } else {
                Ok(value.to_string())
            }
        };

        Ok(Customer {
            first_name: field("First name", &self.first_name)?,
            last_name: field("Last name", &self.last_name)?,
            city: field("City", &self.city)?,
            address: field("Address", &self.address)?,
            phone: field("Phone", &self.phone)?,
            email: Email::parse(&self.email).map_err(|e| format!("Invalid email: {e}"))?,
            additional_info: self.additional_info.trim().to_string(),
        })
    }
}

/// An order header row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: OrderId,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub additional_info: String,
    pub subtotal: Money,
    pub shipping: Money,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// An order line joined with what is left of its product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItemRow {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub size: Option<String>,
    pub unit_price: Money,
    pub product_name: Option<String>,
    pub image: Option<Vec<u8>>,
}

/// An order line as shown to admins.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineView {
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    pub quantity: i32,
    pub size: Option<String>,
    pub unit_price: Money,
}

impl From<OrderItemRow> for OrderLineView {
    fn from(row: OrderItemRow) -> Self {
        Self {
            product_id: row.product_id,
            product_name: row
                .product_name
                .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
            image_url: row.image.as_deref().map(image::to_data_url),
            quantity: row.quantity,
            size: row.size,
            unit_price: row.unit_price,
        }
    }
}

/// An order with its lines.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub additional_info: String,
    pub products: Vec<OrderLineView>,
    pub subtotal: Money,
    pub shipping: Money,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl OrderView {
    #[must_use]
    pub fn new(row: OrderRow, products: Vec<OrderLineView>) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            city: row.city,
            address: row.address,
            phone: row.phone,
            email: row.email,
            additional_info: row.additional_info,
            products,
            subtotal: row.subtotal,
            shipping: row.shipping,
            total_amount: row.total_amount,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

/// Body of `PUT /api/orders/update-status/{id}`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;

    fn checkout(body: serde_json::Value) -> CheckoutRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_customer_validation() {
        let request = checkout(json!({
            "firstName": " Ayesha ",
            "lastName": "Khan",
            "city": "Lahore",
            "address": "12 Mall Road",
            "phone": "0300-1234567",
            "email": "Ayesha@Example.com",
            "products": [{"productId": 1, "quantity": 2, "size": "M"}],
            "totalAmount": 9250
        }));

        let customer = request.customer().unwrap();
        assert_eq!(customer.first_name, "Ayesha");
        assert_eq!(customer.email.as_str(), "ayesha@example.com");
        assert_eq!(customer.additional_info, "");
        assert_eq!(request.products.len(), 1);
        assert_eq!(request.total_amount, Some(Money::from_units(9250)));
    }

    #[test]
    fn test_customer_missing_fields() {
        let request = checkout(json!({"firstName": "A", "email": "a@b.c"}));
        assert_eq!(request.customer().unwrap_err(), "Last name is required");

        let request = checkout(json!({
            "firstName": "A", "lastName": "B", "city": "C", "address": "D",
            "phone": "1", "email": "nope"
        }));
        assert!(request.customer().unwrap_err().starts_with("Invalid email"));
    }

    #[test]
    fn test_line_view_for_deleted_product() {
        let view = OrderLineView::from(OrderItemRow {
            order_id: OrderId::new(1),
            product_id: ProductId::new(9),
            quantity: 2,
            size: None,
            unit_price: Money::from_units(100),
            product_name: None,
            image: None,
        });
        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["productName"], UNKNOWN_PRODUCT);
        assert!(json["imageURL"].is_null());
    }

    #[test]
    fn test_status_update_uses_wire_names() {
        let update: StatusUpdate = serde_json::from_value(json!({"status": "Delivered"})).unwrap();
        assert_eq!(update.status, OrderStatus::Delivered);
        assert!(serde_json::from_value::<StatusUpdate>(json!({"status": "Lost"})).is_err());
    }
}

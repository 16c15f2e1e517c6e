//! Store-wide settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use atelier_core::Money;
use atelier_core::pricing::DeliveryPolicy;

/// The settings singleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Subtotal at which delivery becomes free; `None` disables free delivery.
    pub free_delivery_threshold: Option<Money>,
    pub delivery_fee: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Settings {
    /// The delivery rule these settings describe.
    #[must_use]
    pub const fn policy(&self) -> DeliveryPolicy {
        DeliveryPolicy {
            free_delivery_threshold: self.free_delivery_threshold,
            delivery_fee: self.delivery_fee,
        }
    }
}

/// Body of `PUT /api/settings`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    /// `Some(None)` clears the threshold; `None` leaves it alone.
    #[serde(default, deserialize_with = "present")]
    pub free_delivery_threshold: Option<Option<Money>>,
    #[serde(default)]
    pub delivery_fee: Option<Money>,
}

impl SettingsUpdate {
    /// Apply the update on top of the current rule.
    #[must_use]
    pub fn apply(&self, current: DeliveryPolicy) -> DeliveryPolicy {
        DeliveryPolicy {
            free_delivery_threshold: self
                .free_delivery_threshold
                .unwrap_or(current.free_delivery_threshold),
            delivery_fee: self.delivery_fee.unwrap_or(current.delivery_fee),
        }
    }
}

/// Distinguish an explicit `null` from a missing field.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<Money>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Money>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn current() -> DeliveryPolicy {
        DeliveryPolicy {
            free_delivery_threshold: Some(Money::from_units(5000)),
            delivery_fee: Money::from_units(250),
        }
    }

    #[test]
    fn test_missing_fields_keep_current_values() {
        let update: SettingsUpdate = serde_json::from_value(json!({})).unwrap();
        assert_eq!(update.apply(current()), current());
    }

    #[test]
    fn test_null_threshold_clears_it() {
        let update: SettingsUpdate =
            serde_json::from_value(json!({"freeDeliveryThreshold": null})).unwrap();
        let policy = update.apply(current());
        assert_eq!(policy.free_delivery_threshold, None);
        assert_eq!(policy.delivery_fee, Money::from_units(250));
    }

    #[test]
    fn test_values_replace_current() {
        let update: SettingsUpdate = serde_json::from_value(json!({
            "freeDeliveryThreshold": 3000,
            "deliveryFee": "199.50"
        }))
        .unwrap();
        let policy = update.apply(current());
        assert_eq!(policy.free_delivery_threshold, Some(Money::from_units(3000)));
        assert_eq!(policy.delivery_fee.to_string(), "199.50");
    }

    #[test]
    fn test_non_numeric_values_are_rejected() {
        assert!(serde_json::from_value::<SettingsUpdate>(json!({"deliveryFee": "free"})).is_err());
    }
}

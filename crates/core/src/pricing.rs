//! Order totals and the delivery fee rule.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Money;

/// Delivery fee charged when no free-delivery rule applies.
pub const DEFAULT_DELIVERY_FEE: i64 = 250;

/// Invalid delivery settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("Free delivery threshold must be a non-negative number or null")]
    NegativeThreshold,

    #[error("Delivery fee must be a non-negative number")]
    NegativeFee,
}

/// How shipping is charged.
///
/// Shipping is free once the subtotal reaches `free_delivery_threshold`;
/// without a threshold every order pays `delivery_fee`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPolicy {
    pub free_delivery_threshold: Option<Money>,
    pub delivery_fee: Money,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            free_delivery_threshold: None,
            delivery_fee: Money::from_units(DEFAULT_DELIVERY_FEE),
        }
    }
}

/// Price breakdown for a cart or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
    /// How much more the customer must spend for free delivery, if a
    /// threshold exists and has not been reached.
    pub remaining_for_free_delivery: Option<Money>,
}

impl DeliveryPolicy {
    /// Build a validated policy.
    ///
    /// # Errors
    ///
    /// Returns an error if either amount is negative.
    pub fn new(
        free_delivery_threshold: Option<Money>,
        delivery_fee: Money,
    ) -> Result<Self, PricingError> {
        let policy = Self {
            free_delivery_threshold,
            delivery_fee,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Check both amounts are non-negative.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.free_delivery_threshold.is_some_and(|t| t.is_negative()) {
            return Err(PricingError::NegativeThreshold);
        }
        if self.delivery_fee.is_negative() {
            return Err(PricingError::NegativeFee);
        }
        Ok(())
    }

    /// Shipping charged on a given subtotal.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Money) -> Money {
        match self.free_delivery_threshold {
            Some(threshold) if subtotal >= threshold => Money::ZERO,
            _ => self.delivery_fee,
        }
    }

    /// Full breakdown for a subtotal.
    #[must_use]
    pub fn quote(&self, subtotal: Money) -> Quote {
        let shipping = self.shipping_for(subtotal);
        let remaining_for_free_delivery = self
            .free_delivery_threshold
            .filter(|threshold| subtotal < *threshold)
            .map(|threshold| threshold.saturating_sub(subtotal));
        Quote {
            subtotal,
            shipping,
            total: subtotal + shipping,
            remaining_for_free_delivery,
        }
    }
}

/// Sum of unit price times quantity over priced lines.
pub fn subtotal<I>(lines: I) -> Money
where
    I: IntoIterator<Item = (Money, u32)>,
{
    lines.into_iter().map(|(price, qty)| price.times(qty)).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_default_policy_always_charges_fee() {
        let policy = DeliveryPolicy::default();
        let quote = policy.quote(Money::from_units(10_000));
        assert_eq!(quote.shipping, Money::from_units(250));
        assert_eq!(quote.total, Money::from_units(10_250));
        assert_eq!(quote.remaining_for_free_delivery, None);
    }

    #[test]
    fn test_threshold_reached_is_free() {
        let policy = DeliveryPolicy::new(Some(Money::from_units(5000)), Money::from_units(250))
            .unwrap();

        let at = policy.quote(Money::from_units(5000));
        assert_eq!(at.shipping, Money::ZERO);
        assert_eq!(at.total, Money::from_units(5000));

        let below = policy.quote(Money::from_units(4000));
        assert_eq!(below.shipping, Money::from_units(250));
        assert_eq!(below.total, Money::from_units(4250));
        assert_eq!(
            below.remaining_for_free_delivery,
            Some(Money::from_units(1000))
        );
    }

    #[test]
    fn test_zero_threshold_is_always_free() {
        let policy = DeliveryPolicy::new(Some(Money::ZERO), Money::from_units(250)).unwrap();
        assert_eq!(policy.shipping_for(Money::ZERO), Money::ZERO);
    }

    #[test]
    fn test_rejects_negative_amounts() {
        assert_eq!(
            DeliveryPolicy::new(Some(Money::from_units(-1)), Money::ZERO),
            Err(PricingError::NegativeThreshold)
        );
        assert_eq!(
            DeliveryPolicy::new(None, Money::from_units(-5)),
            Err(PricingError::NegativeFee)
        );
    }

    #[test]
    fn test_subtotal() {
        let price = Money::new(Decimal::new(125_050, 2));
        assert_eq!(
            subtotal([(price, 2), (Money::from_units(100), 3)]),
            Money::new(Decimal::new(280_100, 2))
        );
        assert_eq!(subtotal(std::iter::empty()), Money::ZERO);
    }
}

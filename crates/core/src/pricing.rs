//! Checkout-time order totals.
//!
//! This is an estimate shown before the order is placed. The backend
//! recomputes the totals and its numbers are the ones stored on the order.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::LineItem;
use crate::types::CurrencyCode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("{field} must not be negative")]
    Negative { field: &'static str },
    #[error("tax rate must be between 0 and 1, got {0}")]
    TaxRateOutOfRange(Decimal),
    #[error("currency precision {0} is too large")]
    Precision(u32),
}

/// Shipping and tax rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Subtotals at or above this ship free.
    pub free_shipping_threshold: Decimal,
    pub flat_shipping_fee: Decimal,
    /// Fraction of the subtotal, e.g. `0.18`.
    pub tax_rate: Decimal,
    pub currency: CurrencyCode,
    /// Decimal places amounts are rounded to.
    pub precision: u32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Decimal::from(10_000),
            flat_shipping_fee: Decimal::from(99),
            tax_rate: Decimal::new(18, 2),
            currency: CurrencyCode::INR,
            precision: 2,
        }
    }
}

impl PricingConfig {
    /// # Errors
    ///
    /// Rejects negative amounts, tax rates outside `[0, 1]` and precisions
    /// beyond what [`Decimal`] can represent.
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.free_shipping_threshold.is_sign_negative() {
            return Err(PricingError::Negative {
                field: "free shipping threshold",
            });
        }
        if self.flat_shipping_fee.is_sign_negative() {
            return Err(PricingError::Negative {
                field: "flat shipping fee",
            });
        }
        if self.tax_rate.is_sign_negative() || self.tax_rate > Decimal::ONE {
            return Err(PricingError::TaxRateOutOfRange(self.tax_rate));
        }
        if self.precision > 10 {
            return Err(PricingError::Precision(self.precision));
        }
        Ok(())
    }
}

/// Subtotal, shipping, tax and total for a set of line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    #[serde(with = "rust_decimal::serde::str")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub shipping: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
}

impl OrderTotals {
    /// Compute unrounded totals.
    ///
    /// An empty cart costs nothing, shipping included.
    #[must_use]
    pub fn compute(items: &[LineItem], config: &PricingConfig) -> Self {
        let subtotal: Decimal = items.iter().map(LineItem::line_total).sum();
        let shipping = if items.is_empty() || subtotal >= config.free_shipping_threshold {
            Decimal::ZERO
        } else {
            config.flat_shipping_fee
        };
        let tax = subtotal * config.tax_rate;

        Self {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }

    /// Round each component to `precision` places.
    ///
    /// The total is the sum of the rounded parts so the rounded figures
    /// always add up.
    #[must_use]
    pub fn rounded(&self, precision: u32) -> Self {
        let round = |amount: Decimal| {
            amount.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero)
        };
        let subtotal = round(self.subtotal);
        let shipping = round(self.shipping);
        let tax = round(self.tax);
        Self {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::types::ProductId;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(id: &str, price: &str, quantity: u32) -> LineItem {
        LineItem {
            product_id: ProductId::new(id),
            name: id.to_string(),
            color: "Black".to_string(),
            size: "Standard".to_string(),
            unit_price: dec(price),
            quantity,
            image: None,
        }
    }

    #[test]
    fn test_totals_below_free_shipping_threshold() {
        let items = [item("ps5", "499.99", 1), item("dualsense", "149.99", 2)];
        let totals = OrderTotals::compute(&items, &PricingConfig::default());

        assert_eq!(totals.subtotal, dec("799.97"));
        assert_eq!(totals.shipping, dec("99"));
        assert_eq!(totals.tax, dec("143.9946"));
        assert_eq!(totals.total, dec("1042.9646"));

        let rounded = totals.rounded(2);
        assert_eq!(rounded.total, dec("1042.96"));
        assert_eq!(rounded.tax, dec("143.99"));
        assert_eq!(
            crate::types::Price::new(rounded.total, CurrencyCode::INR).display(2),
            "₹1042.96"
        );
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let config = PricingConfig::default();
        let totals = OrderTotals::compute(&[item("tv", "10000", 1)], &config);
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.total, dec("11800"));

        let totals = OrderTotals::compute(&[item("tv", "9999.99", 1)], &config);
        assert_eq!(totals.shipping, dec("99"));
    }

    #[test]
    fn test_empty_cart_costs_nothing() {
        let totals = OrderTotals::compute(&[], &PricingConfig::default());
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn test_constants_come_from_config() {
        let config = PricingConfig {
            free_shipping_threshold: dec("100"),
            flat_shipping_fee: dec("10"),
            tax_rate: dec("0.08"),
            currency: CurrencyCode::USD,
            precision: 2,
        };
        let totals = OrderTotals::compute(&[item("mouse", "40", 2)], &config);
        assert_eq!(totals.shipping, dec("10"));
        assert_eq!(totals.tax, dec("6.40"));
        assert_eq!(totals.total, dec("96.40"));

        let totals = OrderTotals::compute(&[item("mouse", "50", 2)], &config);
        assert_eq!(totals.shipping, Decimal::ZERO);
    }

    #[test]
    fn test_config_validation() {
        assert!(PricingConfig::default().validate().is_ok());

        let negative_fee = PricingConfig {
            flat_shipping_fee: dec("-1"),
            ..PricingConfig::default()
        };
        assert!(matches!(
            negative_fee.validate(),
            Err(PricingError::Negative { .. })
        ));

        let tax = PricingConfig {
            tax_rate: dec("1.5"),
            ..PricingConfig::default()
        };
        assert_eq!(
            tax.validate(),
            Err(PricingError::TaxRateOutOfRange(dec("1.5")))
        );
    }
}

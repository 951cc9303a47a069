use chrono::{DateTime, Duration, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::config::{CouponKind, CouponRule, PricingConfig};
use crate::types::{DeliveryOption, PriceSummary};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("Invalid coupon code: {0}")]
    InvalidCoupon(String),
    #[error("Unit price cannot be negative")]
    NegativePrice,
    #[error("Order amount is too large")]
    Overflow,
}

/// One priced line going into a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLine {
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl PriceLine {
    pub fn new(unit_price: Decimal, quantity: u32) -> Self {
        Self { unit_price, quantity }
    }

    /// `None` when the line total does not fit in a `Decimal`.
    pub fn total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Cart and checkout arithmetic. Holds only configuration, so every call is pure.
#[derive(Debug, Clone)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Exact-match lookup in the coupon table.
    pub fn resolve_coupon(&self, code: &str) -> Result<&CouponRule, PricingError> {
        self.config
            .coupons
            .get(code)
            .ok_or_else(|| PricingError::InvalidCoupon(code.to_string()))
    }

    /// Tax is charged on the pre-discount subtotal. An empty cart costs nothing.
    pub fn compute_summary(
        &self,
        items: &[PriceLine],
        coupon: Option<&str>,
        delivery: DeliveryOption,
    ) -> Result<PriceSummary, PricingError> {
        if items.iter().any(|i| i.unit_price < Decimal::ZERO) {
            return Err(PricingError::NegativePrice);
        }
        let subtotal = items.iter().try_fold(Decimal::ZERO, |acc, line| {
            line.total().and_then(|t| acc.checked_add(t)).ok_or(PricingError::Overflow)
        })?;
        let total_quantity = items
            .iter()
            .try_fold(0u32, |acc, line| acc.checked_add(line.quantity))
            .ok_or(PricingError::Overflow)?;

        let discount = match coupon {
            Some(code) => self.discount_for(self.resolve_coupon(code)?, subtotal)?,
            None => Decimal::ZERO,
        };

        let shipping = if items.is_empty() {
            Decimal::ZERO
        } else {
            let base = if subtotal >= self.config.free_shipping_threshold {
                Decimal::ZERO
            } else {
                self.config.shipping_fee
            };
            match delivery {
                DeliveryOption::Standard => base,
                DeliveryOption::Express => base + self.config.express_surcharge,
            }
        };

        let tax = round_money(subtotal.checked_mul(self.config.tax_rate).ok_or(PricingError::Overflow)?);
        let total = (subtotal - discount)
            .checked_add(shipping)
            .and_then(|t| t.checked_add(tax))
            .ok_or(PricingError::Overflow)?
            .max(Decimal::ZERO);

        Ok(PriceSummary {
            item_count: items.len() as u32,
            total_quantity,
            subtotal: round_money(subtotal),
            shipping: round_money(shipping),
            tax,
            discount,
            total: round_money(total),
        })
    }

    pub fn estimated_delivery(&self, from: DateTime<Utc>, delivery: DeliveryOption) -> DateTime<Utc> {
        let days = match delivery {
            DeliveryOption::Standard => self.config.standard_delivery_days,
            DeliveryOption::Express => self.config.express_delivery_days,
        };
        from + Duration::days(days)
    }

    fn discount_for(&self, rule: &CouponRule, subtotal: Decimal) -> Result<Decimal, PricingError> {
        let raw = match rule.kind {
            CouponKind::Percent => subtotal
                .checked_mul(rule.value)
                .map(|d| d / Decimal::ONE_HUNDRED)
                .ok_or(PricingError::Overflow)?,
            CouponKind::Flat => rule.value,
        };
        Ok(round_money(raw.max(Decimal::ZERO).min(subtotal)))
    }
}

/// Two decimal places, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> PricingEngine {
        PricingEngine::new(PricingConfig::default())
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn single_item_below_threshold_pays_shipping_and_tax() {
        let summary = engine()
            .compute_summary(&[PriceLine::new(dec("299"), 1)], None, DeliveryOption::Standard)
            .unwrap();
        assert_eq!(summary.subtotal, dec("299"));
        assert_eq!(summary.shipping, dec("50"));
        assert_eq!(summary.tax, dec("14.95"));
        assert_eq!(summary.discount, Decimal::ZERO);
        assert_eq!(summary.total, dec("363.95"));
        assert_eq!(summary.item_count, 1);
        assert_eq!(summary.total_quantity, 1);
    }

    #[test]
    fn threshold_gives_free_shipping() {
        let summary = engine()
            .compute_summary(&[PriceLine::new(dec("599"), 1)], None, DeliveryOption::Standard)
            .unwrap();
        assert_eq!(summary.shipping, Decimal::ZERO);

        let exactly = engine()
            .compute_summary(&[PriceLine::new(dec("250"), 2)], None, DeliveryOption::Standard)
            .unwrap();
        assert_eq!(exactly.shipping, Decimal::ZERO);
    }

    #[test]
    fn express_adds_surcharge_on_top_of_shipping() {
        let cheap = engine()
            .compute_summary(&[PriceLine::new(dec("299"), 1)], None, DeliveryOption::Express)
            .unwrap();
        assert_eq!(cheap.shipping, dec("150"));

        let free = engine()
            .compute_summary(&[PriceLine::new(dec("599"), 1)], None, DeliveryOption::Express)
            .unwrap();
        assert_eq!(free.shipping, dec("100"));
    }

    #[test]
    fn percent_coupon_discounts_subtotal_but_not_tax_base() {
        let summary = engine()
            .compute_summary(&[PriceLine::new(dec("599"), 2)], Some("WELCOME10"), DeliveryOption::Standard)
            .unwrap();
        assert_eq!(summary.subtotal, dec("1198"));
        assert_eq!(summary.discount, dec("119.8"));
        assert_eq!(summary.tax, dec("59.9"));
        assert_eq!(summary.total, dec("1138.1"));
    }

    #[test]
    fn flat_coupon_is_capped_at_subtotal() {
        let summary = engine()
            .compute_summary(&[PriceLine::new(dec("80"), 1)], Some("FLAT100"), DeliveryOption::Standard)
            .unwrap();
        assert_eq!(summary.discount, dec("80"));
        // 80 - 80 + 50 shipping + 4 tax
        assert_eq!(summary.total, dec("54"));
    }

    #[test]
    fn unknown_coupon_is_rejected_without_touching_totals() {
        let items = [PriceLine::new(dec("299"), 1)];
        let err = engine()
            .compute_summary(&items, Some("welcome10"), DeliveryOption::Standard)
            .unwrap_err();
        assert_eq!(err, PricingError::InvalidCoupon("welcome10".to_string()));

        let plain = engine().compute_summary(&items, None, DeliveryOption::Standard).unwrap();
        assert_eq!(plain.total, dec("363.95"));
    }

    #[test]
    fn summary_is_pure() {
        let e = engine();
        let items = [PriceLine::new(dec("449"), 3), PriceLine::new(dec("199.5"), 1)];
        let first = e.compute_summary(&items, Some("SURPRISE20"), DeliveryOption::Express).unwrap();
        let second = e.compute_summary(&items, Some("SURPRISE20"), DeliveryOption::Express).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn subtotal_is_sum_and_total_never_negative() {
        let e = engine();
        let grids: [&[(&str, u32)]; 4] = [
            &[],
            &[("0", 5)],
            &[("10", 1), ("0.01", 3)],
            &[("1299.99", 2), ("49", 7), ("0", 1)],
        ];
        for lines in grids {
            let items: Vec<PriceLine> = lines.iter().map(|(p, q)| PriceLine::new(dec(p), *q)).collect();
            let expected: Decimal = items.iter().filter_map(PriceLine::total).sum();
            for coupon in [None, Some("FLAT100"), Some("SURPRISE20")] {
                let s = e.compute_summary(&items, coupon, DeliveryOption::Standard).unwrap();
                assert_eq!(s.subtotal, expected);
                assert!(s.total >= Decimal::ZERO);
            }
        }
    }

    #[test]
    fn oversized_amounts_are_an_error_not_a_panic() {
        let e = engine();
        let big = Decimal::from_scientific("7e28").unwrap();
        let huge = [PriceLine::new(big, 2)];
        assert_eq!(e.compute_summary(&huge, None, DeliveryOption::Standard), Err(PricingError::Overflow));

        let wide = [PriceLine::new(big, 4_000_000_000)];
        assert_eq!(e.compute_summary(&wide, Some("WELCOME10"), DeliveryOption::Express), Err(PricingError::Overflow));

        let many = [PriceLine::new(dec("1"), u32::MAX), PriceLine::new(dec("1"), 1)];
        assert_eq!(e.compute_summary(&many, None, DeliveryOption::Standard), Err(PricingError::Overflow));

        let line: PriceLine = serde_json::from_str(r#"{"unit_price":7e28,"quantity":4000000000}"#).unwrap();
        assert_eq!(line.total(), None);
    }

    #[test]
    fn negative_prices_are_rejected() {
        let e = engine();
        let items = [PriceLine::new(dec("-10"), 1), PriceLine::new(dec("299"), 1)];
        assert_eq!(e.compute_summary(&items, Some("FLAT100"), DeliveryOption::Standard), Err(PricingError::NegativePrice));
        assert_eq!(e.compute_summary(&items, None, DeliveryOption::Standard), Err(PricingError::NegativePrice));
    }

    #[test]
    fn empty_cart_is_free() {
        let s = engine().compute_summary(&[], None, DeliveryOption::Express).unwrap();
        assert_eq!(s.total, Decimal::ZERO);
        assert_eq!(s.shipping, Decimal::ZERO);
    }

    #[test]
    fn tax_rounds_half_away_from_zero() {
        // 0.05 * 0.9 = 0.045 -> 0.05
        let s = engine()
            .compute_summary(&[PriceLine::new(dec("0.9"), 1)], None, DeliveryOption::Standard)
            .unwrap();
        assert_eq!(s.tax, dec("0.05"));
    }

    #[test]
    fn delivery_estimate_uses_configured_days() {
        let now = Utc::now();
        assert_eq!(engine().estimated_delivery(now, DeliveryOption::Standard), now + Duration::days(5));
        assert_eq!(engine().estimated_delivery(now, DeliveryOption::Express), now + Duration::days(2));
    }
}

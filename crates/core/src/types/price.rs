//! Percentage discounts and the derived prices shown in listings.
//!
//! A product stores its pre-discount unit `price` and a `discount`
//! percentage in `[0, 100]`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned for a discount outside `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("discount must be between 0 and 100, got {0}")]
pub struct DiscountError(pub f64);

/// A validated percentage discount.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(try_from = "f64", into = "f64")]
pub struct Discount(f64);

impl Discount {
    /// No discount.
    pub const NONE: Self = Self(0.0);

    /// Validate a percentage.
    ///
    /// # Errors
    ///
    /// Returns `DiscountError` when the value is NaN or outside `[0, 100]`.
    pub fn new(percent: f64) -> Result<Self, DiscountError> {
        if percent.is_nan() || !(0.0..=100.0).contains(&percent) {
            return Err(DiscountError(percent));
        }
        Ok(Self(percent))
    }

    /// The raw percentage.
    #[must_use]
    pub const fn percent(self) -> f64 {
        self.0
    }

    /// Whether any discount applies.
    #[must_use]
    pub fn is_active(self) -> bool {
        self.0 > 0.0
    }

    /// Display label such as `"15%"`, or `None` without a discount.
    #[must_use]
    pub fn label(self) -> Option<String> {
        self.is_active().then(|| format!("{}%", self.0.round()))
    }

    /// Price after applying the discount to `price`.
    #[must_use]
    pub fn apply(self, price: f64) -> f64 {
        price * (1.0 - self.0 / 100.0)
    }

    /// The strike-through "original" price shown next to `price`.
    ///
    /// Catalog listings treat the stored price as the selling price and
    /// back-compute the original; a 100% discount has no finite original.
    #[must_use]
    pub fn original_for(self, price: f64) -> Option<f64> {
        (self.is_active() && self.0 < 100.0).then(|| price / (1.0 - self.0 / 100.0))
    }
}

impl TryFrom<f64> for Discount {
    type Error = DiscountError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Discount> for f64 {
    fn from(value: Discount) -> Self {
        value.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_range_is_enforced() {
        assert!(Discount::new(0.0).is_ok());
        assert!(Discount::new(100.0).is_ok());
        assert!(Discount::new(-1.0).is_err());
        assert!(Discount::new(100.5).is_err());
        assert!(Discount::new(f64::NAN).is_err());
        assert!(serde_json::from_str::<Discount>("120").is_err());
    }

    #[test]
    fn test_label_and_prices() {
        let d = Discount::new(20.0).unwrap();
        assert_eq!(d.label().as_deref(), Some("20%"));
        assert_eq!(d.apply(50.0), 40.0);
        assert_eq!(d.original_for(40.0), Some(50.0));

        assert_eq!(Discount::NONE.label(), None);
        assert_eq!(Discount::NONE.original_for(40.0), None);
        assert_eq!(Discount::new(100.0).unwrap().original_for(10.0), None);
    }
}

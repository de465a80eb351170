//! Cart totals: subtotal, coupon discount and flat shipping.
//!
//! Nothing here is persisted. A coupon applies to the summary it is passed
//! to and nothing else.

use std::collections::HashMap;

use autocatalog_core::{LineItem, subtotal};
use serde::Serialize;
use thiserror::Error;

/// Shipping charged on any non-empty order.
pub const FLAT_SHIPPING_FEE: f64 = 15.0;

/// Coupon lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    #[error("enter a coupon code")]
    Empty,

    #[error("invalid coupon code: {0}")]
    Unknown(String),
}

/// A coupon that passed lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedCoupon {
    /// Normalized (uppercase) code.
    pub code: String,
    /// Fraction in `[0, 1]`.
    pub rate: f64,
}

/// Fixed table of valid coupon codes.
#[derive(Debug, Clone)]
pub struct CouponTable {
    rates: HashMap<String, f64>,
}

impl CouponTable {
    /// The storefront's built-in codes.
    #[must_use]
    pub fn standard() -> Self {
        Self::from_iter([("SAVE10", 0.10), ("SAVE20", 0.20), ("FIRST", 0.15)])
    }

    /// Look up `code`, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// `CouponError::Empty` for a blank code, `CouponError::Unknown` for a
    /// code not in the table.
    pub fn apply(&self, code: &str) -> Result<AppliedCoupon, CouponError> {
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return Err(CouponError::Empty);
        }

        self.rates
            .get(&code)
            .map(|&rate| AppliedCoupon {
                code: code.clone(),
                rate,
            })
            .ok_or(CouponError::Unknown(code))
    }
}

impl<'a> FromIterator<(&'a str, f64)> for CouponTable {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        Self {
            rates: iter
                .into_iter()
                .map(|(code, rate)| (code.to_uppercase(), rate.clamp(0.0, 1.0)))
                .collect(),
        }
    }
}

/// Derived totals for a cart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub subtotal: f64,
    pub discount_rate: f64,
    pub discount: f64,
    pub shipping: f64,
    pub total: f64,
}

impl CartSummary {
    /// `total = subtotal - subtotal·rate + shipping`, shipping only when
    /// the subtotal is positive.
    #[must_use]
    pub fn compute(items: &[LineItem], coupon: Option<&AppliedCoupon>) -> Self {
        let subtotal = subtotal(items);
        let discount_rate = coupon.map_or(0.0, |c| c.rate);
        let discount = subtotal * discount_rate;
        let shipping = if subtotal > 0.0 { FLAT_SHIPPING_FEE } else { 0.0 };

        Self {
            subtotal,
            discount_rate,
            discount,
            shipping,
            total: subtotal - discount + shipping,
        }
    }
}

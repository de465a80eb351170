//! Payment gateway capability used by checkout.
//!
//! The storefront never talks to a processor directly; it charges through a
//! [`PaymentGateway`] injected into [`crate::state::AppState`].

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use autocatalog_core::PaymentMethod;

/// A charge to run against the customer's chosen method.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeRequest {
    pub method: PaymentMethod,
    /// Amount in the shop currency.
    pub amount: f64,
    pub customer_email: Option<String>,
}

/// A settled charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub transaction_id: String,
}

/// Why a charge did not settle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// The processor refused the charge.
    #[error("payment declined: {0}")]
    Declined(String),

    /// The processor could not be reached.
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),
}

/// Something that can take money.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charge `request.amount` to `request.method`.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Declined` when the charge is refused and
    /// `PaymentError::Unavailable` when the processor cannot be reached.
    async fn charge(&self, request: &ChargeRequest) -> Result<PaymentReceipt, PaymentError>;
}

/// Approves every charge, optionally declining amounts above a ceiling.
///
/// Transaction ids follow the processor conventions, e.g. `pp_<millis>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedGateway {
    decline_above: Option<f64>,
}

impl SimulatedGateway {
    /// A gateway that approves everything.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            decline_above: None,
        }
    }

    /// Decline charges strictly above `ceiling`.
    #[must_use]
    pub const fn decline_above(mut self, ceiling: f64) -> Self {
        self.decline_above = Some(ceiling);
        self
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<PaymentReceipt, PaymentError> {
        if let Some(ceiling) = self.decline_above
            && request.amount > ceiling
        {
            tracing::info!(amount = request.amount, ceiling, "Simulated charge declined");
            return Err(PaymentError::Declined(format!(
                "amount exceeds {ceiling:.2}"
            )));
        }

        Ok(PaymentReceipt {
            transaction_id: format!(
                "{}_{}",
                request.method.transaction_prefix(),
                Utc::now().timestamp_millis()
            ),
        })
    }
}

//! Status and classification enums for catalog entities.

use serde::{Deserialize, Serialize};

/// Kind of digital product sold in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    /// Electronic parts catalog (EPC).
    PartsCatalog,
    /// Workshop / repair manual.
    RepairManual,
    /// Electrical wiring diagrams.
    WiringDiagram,
    /// Dealer service manual.
    ServiceManual,
    /// Diagnostic or programming software.
    DiagnosticSoftware,
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// The wire/database spelling of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            "REFUNDED" => Ok(Self::Refunded),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Payment methods accepted at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Visa,
    Mastercard,
    Paypal,
    Crypto,
    BankTransfer,
}

impl PaymentMethod {
    /// The wire/database spelling of this method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Visa => "visa",
            Self::Mastercard => "mastercard",
            Self::Paypal => "paypal",
            Self::Crypto => "crypto",
            Self::BankTransfer => "bank_transfer",
        }
    }

    /// Transaction id prefix used by the processor for this method.
    #[must_use]
    pub const fn transaction_prefix(self) -> &'static str {
        match self {
            Self::Visa | Self::Mastercard => "txn",
            Self::Paypal => "pp",
            Self::Crypto => "crypto",
            Self::BankTransfer => "bt",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "visa" => Ok(Self::Visa),
            "mastercard" => Ok(Self::Mastercard),
            "paypal" => Ok(Self::Paypal),
            "crypto" => Ok(Self::Crypto),
            "bank_transfer" => Ok(Self::BankTransfer),
            _ => Err(format!("unsupported payment method: {s}")),
        }
    }
}

//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Password registration, sign-in, and profile changes
//! - `payment` - Payment gateway capability and the simulated gateway

pub mod auth;
pub mod payment;

pub use auth::{AuthError, AuthService};
pub use payment::{ChargeRequest, PaymentError, PaymentGateway, PaymentReceipt, SimulatedGateway};

//! Core types for Prostore.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod email;
pub mod id;
pub mod money;
pub mod payment;
pub mod status;

pub use address::ShippingAddress;
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{CurrencyCode, Money, MoneyError, round2};
pub use payment::PaymentResult;
pub use status::*;

//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use prostore_core::{Email, PaymentMethod, ShippingAddress, UserId, UserRole};

/// A shopper or back-office user.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
    /// Saved shipping address, set during checkout.
    pub address: Option<ShippingAddress>,
    /// Saved payment method, set during checkout.
    pub payment_method: Option<PaymentMethod>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

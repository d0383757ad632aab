//! Roles and payment methods.

use serde::{Deserialize, Serialize};

/// Role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Access to the back-office.
    Admin,
    /// Regular shopper.
    #[default]
    User,
}

impl UserRole {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

/// How the shopper intends to pay for an order.
///
/// The string forms (`PayPal`, `Stripe`, `CashOnDelivery`) are what clients
/// send and what is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "store.payment_method"))]
pub enum PaymentMethod {
    #[default]
    PayPal,
    Stripe,
    CashOnDelivery,
}

impl PaymentMethod {
    pub const ALL: [Self; 3] = [Self::PayPal, Self::Stripe, Self::CashOnDelivery];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PayPal => "PayPal",
            Self::Stripe => "Stripe",
            Self::CashOnDelivery => "CashOnDelivery",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s.trim())
            .ok_or_else(|| format!("invalid payment method: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_string_forms() {
        for method in PaymentMethod::ALL {
            assert_eq!(method.to_string().parse::<PaymentMethod>().unwrap(), method);
        }
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap(),
            "\"CashOnDelivery\""
        );
        assert!("Bitcoin".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_user_role_defaults_to_user() {
        assert_eq!(UserRole::default(), UserRole::User);
        assert!(!UserRole::User.is_admin());
        assert!("admin".parse::<UserRole>().unwrap().is_admin());
    }
}

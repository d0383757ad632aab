//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Sign-up, sign-in and profile updates (argon2 passwords)
//! - `catalog` - Product listings and search, with a short-lived cache
//! - `cart` - Session and user carts
//! - `checkout` - Shipping address, payment method, order placement
//! - `orders` - Order lookup, payment capture and the back-office lifecycle
//! - `reviews` - Product reviews and rating aggregation
//!
//! Services own validation and orchestration. Repositories own SQL.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod reviews;

pub use auth::{AuthError, AuthService};
pub use cart::{CartContext, CartService};
pub use catalog::{CatalogCache, CatalogService, new_catalog_cache};
pub use checkout::{CheckoutService, PlaceOrderOutcome};
pub use orders::{OrderService, PayPalPaymentStart, StripePaymentStart, StripeReturn};
pub use reviews::ReviewService;

use serde::Serialize;
use thiserror::Error;

use prostore_core::cart::CartError;
use prostore_core::validation::ValidationErrors;

use crate::db::RepositoryError;
use crate::payments::PaymentError;

/// Domain failures raised by services.
///
/// Messages are shown to the shopper as-is.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// A referenced entity does not exist.
    #[error("{0}")]
    NotFound(&'static str),

    /// The operation conflicts with the entity's current state.
    #[error("{0}")]
    Conflict(String),

    /// The caller must sign in first.
    #[error("User is not authenticated")]
    Unauthenticated,

    /// The caller may not see or change this entity.
    #[error("You are not allowed to access this resource")]
    Forbidden,

    /// No session cart id is present.
    #[error("Cart Session not found")]
    MissingCartSession,

    /// A cart rule rejected the change.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// A payment processor call failed.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    /// Map a repository error, turning `NotFound` into a named entity miss and
    /// `Conflict` into a domain conflict.
    #[must_use]
    pub fn from_repo(err: RepositoryError, missing: &'static str) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound(missing),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Repository(other),
        }
    }
}

/// Outcome of a shopper action, mirroring `{ success, message, redirect_to }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

impl ActionResponse {
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            redirect_to: None,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            redirect_to: None,
        }
    }

    #[must_use]
    pub fn redirect(mut self, to: impl Into<String>) -> Self {
        self.redirect_to = Some(to.into());
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_action_response_omits_missing_redirect() {
        let json = serde_json::to_value(ActionResponse::ok("Done")).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "message": "Done" }));
    }

    #[test]
    fn test_action_response_redirect() {
        let json =
            serde_json::to_value(ActionResponse::failed("Your Cart is empty").redirect("/cart"))
                .unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["redirect_to"], "/cart");
    }

    #[test]
    fn test_repo_errors_map_to_domain_errors() {
        assert!(matches!(
            ServiceError::from_repo(RepositoryError::NotFound, "Order not found"),
            ServiceError::NotFound("Order not found")
        ));
        assert_eq!(
            ServiceError::from_repo(
                RepositoryError::Conflict("Order is already paid".into()),
                "Order not found"
            )
            .to_string(),
            "Order is already paid"
        );
    }
}

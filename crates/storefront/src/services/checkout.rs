//! Checkout: shipping address, payment method and order placement.

use sqlx::PgPool;
use tracing::{info, instrument};

use prostore_core::validation::ValidationErrors;
use prostore_core::{OrderId, PaymentMethod, ShippingAddress, UserId};

use super::cart::CartContext;
use super::{ActionResponse, ServiceError};
use crate::config::StoreConfig;
use crate::db::{CartRepository, OrderRepository, UserRepository};

/// Result of trying to place an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceOrderOutcome {
    Placed(OrderId),
    /// A checkout step is missing; the shopper is sent back to it.
    Incomplete {
        message: &'static str,
        redirect_to: &'static str,
    },
}

impl From<PlaceOrderOutcome> for ActionResponse {
    fn from(outcome: PlaceOrderOutcome) -> Self {
        match outcome {
            PlaceOrderOutcome::Placed(id) => {
                Self::ok("Order placed successfully").redirect(format!("/order/{id}"))
            }
            PlaceOrderOutcome::Incomplete {
                message,
                redirect_to,
            } => Self::failed(message).redirect(redirect_to),
        }
    }
}

/// Checkout steps for a signed-in shopper.
pub struct CheckoutService<'a> {
    users: UserRepository<'a>,
    carts: CartRepository<'a>,
    orders: OrderRepository<'a>,
    store: &'a StoreConfig,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, store: &'a StoreConfig) -> Self {
        Self {
            users: UserRepository::new(pool),
            carts: CartRepository::new(pool),
            orders: OrderRepository::new(pool),
            store,
        }
    }

    /// Save the shopper's shipping address.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if a field is too short.
    pub async fn update_address(
        &self,
        user_id: UserId,
        address: &ShippingAddress,
    ) -> Result<ActionResponse, ServiceError> {
        address.validate()?;
        self.users
            .update_address(user_id, address)
            .await
            .map_err(|e| ServiceError::from_repo(e, "User not found"))?;
        Ok(ActionResponse::ok("User updated successfully"))
    }

    /// Save the shopper's payment method.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the store does not accept the method.
    pub async fn update_payment_method(
        &self,
        user_id: UserId,
        method: PaymentMethod,
    ) -> Result<ActionResponse, ServiceError> {
        if !self.store.accepts(method) {
            return Err(ValidationErrors::single("type", "Invalid payment method").into());
        }
        self.users
            .update_payment_method(user_id, method)
            .await
            .map_err(|e| ServiceError::from_repo(e, "User not found"))?;
        Ok(ActionResponse::ok("User updated successfully"))
    }

    /// Turn the shopper's cart into an order.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Unauthenticated` without a signed-in user.
    /// Returns `ServiceError::Repository` if the order transaction fails.
    #[instrument(skip(self))]
    pub async fn place_order(&self, ctx: CartContext) -> Result<PlaceOrderOutcome, ServiceError> {
        let user_id = ctx.user_id.ok_or(ServiceError::Unauthenticated)?;

        let cart = self.carts.find_by_user(user_id).await?;
        let Some(cart) = cart.filter(|c| !c.is_empty()) else {
            return Ok(PlaceOrderOutcome::Incomplete {
                message: "Your Cart is empty",
                redirect_to: "/cart",
            });
        };

        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(ServiceError::NotFound("User not found"))?;

        let Some(address) = user.address else {
            return Ok(PlaceOrderOutcome::Incomplete {
                message: "Shipping address not found",
                redirect_to: "/shipping-address",
            });
        };
        let Some(payment_method) = user.payment_method else {
            return Ok(PlaceOrderOutcome::Incomplete {
                message: "Payment method not found",
                redirect_to: "/payment-method",
            });
        };

        let Some(order_id) = self
            .orders
            .create_from_cart(user_id, cart.id, &address, payment_method)
            .await?
        else {
            return Ok(PlaceOrderOutcome::Incomplete {
                message: "Your Cart is empty",
                redirect_to: "/cart",
            });
        };

        info!(order_id = %order_id, payment_method = %payment_method, "Checkout complete");
        Ok(PlaceOrderOutcome::Placed(order_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_placed_redirects_to_order_page() {
        let id = OrderId::new();
        let response = ActionResponse::from(PlaceOrderOutcome::Placed(id));
        assert!(response.success);
        assert_eq!(response.message, "Order placed successfully");
        assert_eq!(response.redirect_to.unwrap(), format!("/order/{id}"));
    }

    #[test]
    fn test_incomplete_redirects_back() {
        let response = ActionResponse::from(PlaceOrderOutcome::Incomplete {
            message: "Your Cart is empty",
            redirect_to: "/cart",
        });
        assert!(!response.success);
        assert_eq!(response.redirect_to.as_deref(), Some("/cart"));
    }
}

//! Orders: lookup, payment capture, and the back-office lifecycle.

use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use prostore_core::catalog::{Page, Pagination};
use prostore_core::{OrderId, PaymentMethod, PaymentResult, UserId};

use super::{ActionResponse, ServiceError};
use crate::db::OrderRepository;
use crate::models::{CurrentUser, Order, OrderDetail, OrderSummary, SalesData};
use crate::payments::stripe::WebhookEvent;
use crate::payments::{PayPalClient, PaymentError, StripeClient};

/// Returned when a PayPal order has been opened for an order.
#[derive(Debug, Clone, Serialize)]
pub struct PayPalPaymentStart {
    pub success: bool,
    pub message: &'static str,
    /// PayPal's order id, handed to the buyer's approval flow.
    pub data: String,
}

/// Returned when a Stripe payment intent has been created for an order.
#[derive(Debug, Clone, Serialize)]
pub struct StripePaymentStart {
    pub client_secret: String,
}

/// What the Stripe return page should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeReturn {
    Succeeded(OrderId),
    /// Not settled yet; send the shopper back to the order.
    Pending(OrderId),
}

impl From<StripeReturn> for ActionResponse {
    fn from(value: StripeReturn) -> Self {
        match value {
            StripeReturn::Succeeded(id) => {
                Self::ok("Thanks for your purchase").redirect(format!("/order/{id}"))
            }
            StripeReturn::Pending(id) => {
                Self::failed("Payment not completed").redirect(format!("/order/{id}"))
            }
        }
    }
}

/// Order operations for shoppers and the back office.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
    paypal: Option<&'a PayPalClient>,
    stripe: Option<&'a StripeClient>,
}

impl<'a> OrderService<'a> {
    /// Order service without payment processors (back office).
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            paypal: None,
            stripe: None,
        }
    }

    #[must_use]
    pub const fn with_processors(
        mut self,
        paypal: Option<&'a PayPalClient>,
        stripe: Option<&'a StripeClient>,
    ) -> Self {
        self.paypal = paypal;
        self.stripe = stripe;
        self
    }

    fn paypal(&self) -> Result<&'a PayPalClient, ServiceError> {
        self.paypal
            .ok_or(ServiceError::Payment(PaymentError::NotConfigured("PayPal")))
    }

    fn stripe(&self) -> Result<&'a StripeClient, ServiceError> {
        self.stripe
            .ok_or(ServiceError::Payment(PaymentError::NotConfigured("Stripe")))
    }

    async fn order(&self, id: OrderId) -> Result<Order, ServiceError> {
        self.orders
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound("Order not found"))
    }

    /// An order with items and owner. Only the owner or an admin may look.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the order does not exist.
    /// Returns `ServiceError::Forbidden` for other shoppers' orders.
    pub async fn get_order(
        &self,
        id: OrderId,
        viewer: &CurrentUser,
    ) -> Result<OrderDetail, ServiceError> {
        let detail = self
            .orders
            .get_detail(id)
            .await?
            .ok_or(ServiceError::NotFound("Order not found"))?;
        ensure_can_view(detail.order.user_id, viewer)?;
        Ok(detail)
    }

    /// The shopper's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn my_orders(
        &self,
        user_id: UserId,
        page: Option<u32>,
        limit: u32,
    ) -> Result<Page<Order>, ServiceError> {
        let pagination = Pagination::new(page, limit);
        let (orders, total) = self.orders.list_for_user(user_id, pagination).await?;
        Ok(Page::new(orders, pagination, total))
    }

    /// Record a payment and take stock.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the order does not exist.
    /// Returns `ServiceError::Conflict` ("Order is already paid") on a repeat.
    pub async fn update_order_to_paid(
        &self,
        id: OrderId,
        result: Option<&PaymentResult>,
    ) -> Result<(), ServiceError> {
        self.orders
            .mark_paid(id, result)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Order not found"))
    }

    /// Back-office: cash on delivery was collected.
    ///
    /// # Errors
    ///
    /// See [`OrderService::update_order_to_paid`].
    #[instrument(skip(self))]
    pub async fn mark_paid_cod(&self, id: OrderId) -> Result<ActionResponse, ServiceError> {
        self.update_order_to_paid(id, None).await?;
        Ok(ActionResponse::ok("Order marked as paid"))
    }

    /// Back-office: the parcel arrived.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Conflict` if the order is unpaid or already delivered.
    #[instrument(skip(self))]
    pub async fn deliver(&self, id: OrderId) -> Result<ActionResponse, ServiceError> {
        self.orders
            .mark_delivered(id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Order not found"))?;
        Ok(ActionResponse::ok("Order marked as delivered"))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the order does not exist.
    pub async fn delete(&self, id: OrderId) -> Result<ActionResponse, ServiceError> {
        self.orders
            .delete(id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Order not found"))?;
        Ok(ActionResponse::ok("Order deleted successfully"))
    }

    /// Back-office order list, filtered by the owner's name.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn all_orders(
        &self,
        user_query: Option<&str>,
        page: Option<u32>,
        limit: u32,
    ) -> Result<Page<OrderSummary>, ServiceError> {
        let query = user_query.filter(|q| !q.is_empty() && *q != "all");
        let pagination = Pagination::new(page, limit);
        let (orders, total) = self.orders.list_all(query, pagination).await?;
        Ok(Page::new(orders, pagination, total))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if a query fails.
    pub async fn sales_data(&self) -> Result<SalesData, ServiceError> {
        Ok(self.orders.sales_data().await?)
    }

    // =========================================================================
    // PayPal
    // =========================================================================

    /// Open a PayPal order for the order total and remember its id.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the order does not exist.
    /// Returns `ServiceError::Payment` if PayPal is unavailable or refuses.
    #[instrument(skip(self, viewer))]
    pub async fn create_paypal_order(
        &self,
        id: OrderId,
        viewer: &CurrentUser,
    ) -> Result<PayPalPaymentStart, ServiceError> {
        let paypal = self.paypal()?;
        let order = self.order(id).await?;
        ensure_can_view(order.user_id, viewer)?;
        ensure_unpaid(&order)?;

        let paypal_order = paypal.create_order(order.prices.total_price).await?;
        self.orders
            .set_payment_result(id, &PaymentResult::pending(&paypal_order.id))
            .await
            .map_err(|e| ServiceError::from_repo(e, "Order not found"))?;

        Ok(PayPalPaymentStart {
            success: true,
            message: "PayPal order created successfully",
            data: paypal_order.id,
        })
    }

    /// Capture an approved PayPal order and mark our order paid.
    ///
    /// The capture must match the PayPal order recorded by
    /// [`OrderService::create_paypal_order`] and be `COMPLETED`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Payment(PaymentError::NotCompleted)` otherwise.
    #[instrument(skip(self, viewer))]
    pub async fn approve_paypal_order(
        &self,
        id: OrderId,
        paypal_order_id: &str,
        viewer: &CurrentUser,
    ) -> Result<ActionResponse, ServiceError> {
        let paypal = self.paypal()?;
        let order = self.order(id).await?;
        ensure_can_view(order.user_id, viewer)?;

        let capture = paypal.capture_payment(paypal_order_id).await?;
        let expected = order.payment_result.as_ref().map(|r| r.id.as_str());
        if expected != Some(capture.id.as_str()) || capture.status != PaymentResult::COMPLETED {
            warn!(capture_id = %capture.id, status = %capture.status, "PayPal capture rejected");
            return Err(PaymentError::NotCompleted.into());
        }

        let result = PaymentResult {
            id: capture.id.clone(),
            status: capture.status.clone(),
            email_address: capture.payer_email().to_owned(),
            price_paid: capture.amount_paid().unwrap_or("0").to_owned(),
        };
        self.update_order_to_paid(id, Some(&result)).await?;

        info!(order_id = %id, "PayPal payment captured");
        Ok(ActionResponse::ok("Order paid successfully"))
    }

    // =========================================================================
    // Stripe
    // =========================================================================

    /// Create a payment intent for an unpaid Stripe order.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Conflict` if the order is paid or not a Stripe order.
    #[instrument(skip(self, viewer))]
    pub async fn create_stripe_payment_intent(
        &self,
        id: OrderId,
        viewer: &CurrentUser,
    ) -> Result<StripePaymentStart, ServiceError> {
        let stripe = self.stripe()?;
        let order = self.order(id).await?;
        ensure_can_view(order.user_id, viewer)?;
        ensure_unpaid(&order)?;
        if order.payment_method != PaymentMethod::Stripe {
            return Err(ServiceError::Conflict(
                "Order is not paid with Stripe".to_owned(),
            ));
        }

        let intent = stripe
            .create_payment_intent(order.prices.total_price, id)
            .await?;
        let client_secret = intent
            .client_secret
            .ok_or_else(|| ServiceError::Payment(PaymentError::NotCompleted))?;
        Ok(StripePaymentStart { client_secret })
    }

    /// Check the payment intent the shopper returned with.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` if the viewer does not own the order.
    /// Returns `ServiceError::NotFound` if the intent belongs to another order.
    #[instrument(skip(self, viewer), fields(viewer_id = %viewer.id))]
    pub async fn stripe_return(
        &self,
        id: OrderId,
        payment_intent_id: &str,
        viewer: &CurrentUser,
    ) -> Result<StripeReturn, ServiceError> {
        let order = self.order(id).await?;
        ensure_can_view(order.user_id, viewer)?;
        let stripe = self.stripe()?;
        let intent = stripe.retrieve_payment_intent(payment_intent_id).await?;

        let order_id = order.id.to_string();
        if intent.order_id() != Some(order_id.as_str()) {
            return Err(ServiceError::NotFound("Order not found"));
        }

        Ok(if intent.is_succeeded() {
            StripeReturn::Succeeded(order.id)
        } else {
            StripeReturn::Pending(order.id)
        })
    }

    /// Handle a verified Stripe webhook delivery.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Payment` if the signature does not verify.
    /// Returns `ServiceError::NotFound` if the charge names an unknown order.
    #[instrument(skip(self, payload, signature))]
    pub async fn handle_stripe_webhook(
        &self,
        payload: &str,
        signature: &str,
    ) -> Result<ActionResponse, ServiceError> {
        let stripe = self.stripe()?;
        let event: WebhookEvent = stripe.construct_event(payload, signature)?;

        let Some(charge) = event.succeeded_charge()? else {
            return Ok(ActionResponse::ok("event is not charge.succeeded"));
        };

        let order_id: OrderId = charge
            .order_id()
            .and_then(|raw| raw.parse().ok())
            .ok_or(ServiceError::NotFound("Order not found"))?;

        let result = PaymentResult {
            id: charge.id.clone(),
            status: PaymentResult::COMPLETED.to_owned(),
            email_address: charge.billing_details.email.clone().unwrap_or_default(),
            price_paid: charge.amount_paid()?.to_string(),
        };
        self.update_order_to_paid(order_id, Some(&result)).await?;

        info!(order_id = %order_id, charge_id = %charge.id, "Stripe charge recorded");
        Ok(ActionResponse::ok("updateOrderToPaid was successful"))
    }
}

fn ensure_can_view(owner: UserId, viewer: &CurrentUser) -> Result<(), ServiceError> {
    if viewer.id == owner || viewer.role.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}

fn ensure_unpaid(order: &Order) -> Result<(), ServiceError> {
    if order.is_paid {
        Err(ServiceError::Conflict("Order is already paid".to_owned()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use prostore_core::{Email, UserRole};

    fn viewer(role: UserRole) -> CurrentUser {
        CurrentUser {
            id: UserId::new(),
            name: "Jane".into(),
            email: Email::parse("jane@example.com").unwrap(),
            role,
        }
    }

    #[test]
    fn test_owner_and_admin_can_view() {
        let shopper = viewer(UserRole::User);
        assert!(ensure_can_view(shopper.id, &shopper).is_ok());
        assert!(ensure_can_view(UserId::new(), &viewer(UserRole::Admin)).is_ok());
    }

    #[test]
    fn test_other_shoppers_cannot_view() {
        assert!(matches!(
            ensure_can_view(UserId::new(), &viewer(UserRole::User)),
            Err(ServiceError::Forbidden)
        ));
    }

    #[test]
    fn test_stripe_return_messages() {
        let id = OrderId::new();
        let ok = ActionResponse::from(StripeReturn::Succeeded(id));
        assert!(ok.success);
        let pending = ActionResponse::from(StripeReturn::Pending(id));
        assert!(!pending.success);
        assert_eq!(pending.redirect_to.unwrap(), format!("/order/{id}"));
    }
}

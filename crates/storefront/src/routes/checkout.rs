//! Checkout route handlers: shipping address, payment method, place order.

use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;

use prostore_core::{PaymentMethod, ShippingAddress};

use crate::error::Result;
use crate::middleware::{CartSession, RequireAuth};
use crate::services::{ActionResponse, CheckoutService};
use crate::state::AppState;

/// Payment method selection, `{ "type": "Stripe" }`.
#[derive(Debug, Deserialize)]
pub struct PaymentMethodRequest {
    #[serde(rename = "type")]
    pub method: PaymentMethod,
}

/// Payment methods this store accepts, and the preselected one.
pub async fn payment_methods(State(state): State<AppState>) -> impl IntoResponse {
    let store = &state.config().store;
    Json(json!({
        "payment_methods": store.payment_methods,
        "default_payment_method": store.default_payment_method,
    }))
}

#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(address): Json<ShippingAddress>,
) -> Result<impl IntoResponse> {
    let service = CheckoutService::new(state.pool(), &state.config().store);
    Ok(Json(service.update_address(user.id, &address).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_payment_method(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<PaymentMethodRequest>,
) -> Result<impl IntoResponse> {
    let service = CheckoutService::new(state.pool(), &state.config().store);
    Ok(Json(
        service
            .update_payment_method(user.id, request.method)
            .await?,
    ))
}

/// Turn the cart into an order.
///
/// A missing checkout step is not an error: the response carries
/// `success: false` and where to send the shopper.
#[tracing::instrument(skip_all)]
pub async fn place_order(
    State(state): State<AppState>,
    CartSession(ctx): CartSession,
) -> Result<impl IntoResponse> {
    let service = CheckoutService::new(state.pool(), &state.config().store);
    let outcome = service.place_order(ctx).await?;
    Ok(Json(ActionResponse::from(outcome)))
}

//! Order and payment route handlers.
//!
//! ```text
//! GET  /api/orders                          - My orders (paginated)
//! GET  /api/orders/{id}                     - Order detail (owner or admin)
//! POST /api/orders/{id}/paypal              - Open a PayPal order
//! POST /api/orders/{id}/paypal/approve      - Capture an approved PayPal order
//! POST /api/orders/{id}/stripe              - Create a Stripe payment intent
//! GET  /api/orders/{id}/stripe/success      - Stripe return page
//! POST /api/webhooks/stripe                 - Stripe webhook
//! ```

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;

use prostore_core::OrderId;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::payments::stripe::SIGNATURE_HEADER;
use crate::services::{ActionResponse, OrderService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ApprovePayPalRequest {
    /// PayPal's order id, as returned when the PayPal order was opened.
    pub order_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeReturnQuery {
    pub payment_intent: String,
}

fn orders(state: &AppState) -> OrderService<'_> {
    OrderService::new(state.pool()).with_processors(state.paypal(), state.stripe())
}

pub async fn my_orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let limit = query.limit.unwrap_or(state.config().store.page_size);
    let page = orders(&state).my_orders(user.id, query.page, limit).await?;
    Ok(Json(page))
}

#[tracing::instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    Ok(Json(orders(&state).get_order(id, &user).await?))
}

pub async fn create_paypal_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    Ok(Json(orders(&state).create_paypal_order(id, &user).await?))
}

pub async fn approve_paypal_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    Json(request): Json<ApprovePayPalRequest>,
) -> Result<impl IntoResponse> {
    let response = orders(&state)
        .approve_paypal_order(id, &request.order_id, &user)
        .await?;
    Ok(Json(response))
}

pub async fn create_stripe_payment_intent(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let start = orders(&state)
        .create_stripe_payment_intent(id, &user)
        .await?;
    Ok(Json(start))
}

/// Where Stripe sends the shopper after card confirmation.
pub async fn stripe_success(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    Query(query): Query<StripeReturnQuery>,
) -> Result<impl IntoResponse> {
    let outcome = orders(&state)
        .stripe_return(id, &query.payment_intent, &user)
        .await?;
    Ok(Json(ActionResponse::from(outcome)))
}

/// Stripe webhook. The raw body is needed for signature verification.
#[tracing::instrument(skip_all)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing Stripe-Signature header".to_string()))?;

    let response = orders(&state)
        .handle_stripe_webhook(&body, signature)
        .await?;
    Ok((StatusCode::OK, Json(response)))
}

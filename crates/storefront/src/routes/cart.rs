//! Cart route handlers.
//!
//! The cart is found through [`CartSession`]: by user when signed in,
//! otherwise by the session cart id.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use prostore_core::ProductId;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::CartSession;
use crate::services::CartService;
use crate::state::AppState;

/// Add-to-cart request. Only the product is taken from the client; name,
/// price and image are read from the catalog.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
}

/// The caller's cart, or an empty item list when there is none yet.
pub async fn show(
    State(state): State<AppState>,
    CartSession(ctx): CartSession,
) -> Result<impl IntoResponse> {
    let cart = CartService::new(state.pool()).get_my_cart(ctx).await?;
    Ok(match cart {
        Some(cart) => Json(json!(cart)),
        None => Json(json!({ "items": [] })),
    })
}

/// Add one unit of a product.
#[tracing::instrument(skip(state, ctx))]
pub async fn add(
    State(state): State<AppState>,
    CartSession(ctx): CartSession,
    Json(request): Json<AddToCartRequest>,
) -> Result<impl IntoResponse> {
    let response = CartService::new(state.pool())
        .add_item(ctx, request.product_id)
        .await?;
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", &request.product_id.to_string())]),
    );
    Ok(Json(response))
}

/// Remove one unit of a product.
#[tracing::instrument(skip(state, ctx))]
pub async fn remove(
    State(state): State<AppState>,
    CartSession(ctx): CartSession,
    Path(product_id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let response = CartService::new(state.pool())
        .remove_item(ctx, product_id)
        .await?;
    Ok(Json(response))
}

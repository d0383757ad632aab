//! Order management routes.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use prostore_core::OrderId;
use prostore_storefront::error::Result;
use prostore_storefront::services::OrderService;

use super::ListQuery;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// All orders, filtered by the owner's name.
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let page = OrderService::new(state.pool())
        .all_orders(query.query.as_deref(), query.page, state.page_size())
        .await?;
    Ok(Json(page))
}

pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    Ok(Json(OrderService::new(state.pool()).get_order(id, &admin).await?))
}

/// Cash on delivery collected.
#[tracing::instrument(skip_all, fields(admin_id = %admin.id, order_id = %id))]
pub async fn mark_paid(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    Ok(Json(OrderService::new(state.pool()).mark_paid_cod(id).await?))
}

#[tracing::instrument(skip_all, fields(admin_id = %admin.id, order_id = %id))]
pub async fn deliver(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    Ok(Json(OrderService::new(state.pool()).deliver(id).await?))
}

#[tracing::instrument(skip_all, fields(admin_id = %admin.id, order_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    Ok(Json(OrderService::new(state.pool()).delete(id).await?))
}

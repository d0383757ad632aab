//! Sales dashboard.

use axum::{Json, extract::State, response::IntoResponse};

use prostore_storefront::error::Result;
use prostore_storefront::services::OrderService;

use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Totals, monthly sales and the latest orders.
#[tracing::instrument(skip_all)]
pub async fn overview(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<impl IntoResponse> {
    Ok(Json(OrderService::new(state.pool()).sales_data().await?))
}

//! Review route handlers.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use prostore_core::ProductId;
use prostore_core::forms::ReviewForm;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::ReviewService;
use crate::state::AppState;

/// Create or replace the caller's review.
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn submit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(form): Json<ReviewForm>,
) -> Result<impl IntoResponse> {
    let response = ReviewService::new(state.pool())
        .create_update_review(user.id, &form)
        .await?;
    Ok(Json(response))
}

pub async fn list(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    Ok(Json(ReviewService::new(state.pool()).get_reviews(product_id).await?))
}

/// The caller's review of a product, `null` when they have not written one.
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let review = ReviewService::new(state.pool())
        .get_review_by_product_id(user.id, product_id)
        .await?;
    Ok(Json(review))
}

//! Product management routes.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use prostore_core::ProductId;
use prostore_core::forms::ProductForm;
use prostore_storefront::error::Result;

use super::ListQuery;
use crate::middleware::RequireAdmin;
use crate::services::ProductAdminService;
use crate::state::AppState;

pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let page = ProductAdminService::new(state.pool())
        .list(query.query.as_deref(), query.page, state.page_size())
        .await?;
    Ok(Json(page))
}

pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    Ok(Json(ProductAdminService::new(state.pool()).get(id).await?))
}

#[tracing::instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(form): Json<ProductForm>,
) -> Result<impl IntoResponse> {
    let response = ProductAdminService::new(state.pool()).create(form).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[tracing::instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(form): Json<ProductForm>,
) -> Result<impl IntoResponse> {
    Ok(Json(ProductAdminService::new(state.pool()).update(id, form).await?))
}

#[tracing::instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    Ok(Json(ProductAdminService::new(state.pool()).delete(id).await?))
}

//! User management routes.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use prostore_core::UserId;
use prostore_core::forms::UserUpdateForm;
use prostore_storefront::error::Result;

use super::ListQuery;
use crate::middleware::RequireAdmin;
use crate::services::UserAdminService;
use crate::state::AppState;

pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let page = UserAdminService::new(state.pool())
        .list(query.query.as_deref(), query.page, state.page_size())
        .await?;
    Ok(Json(page))
}

pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse> {
    Ok(Json(UserAdminService::new(state.pool()).get(id).await?))
}

#[tracing::instrument(skip_all, fields(admin_id = %admin.id, user_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
    Json(form): Json<UserUpdateForm>,
) -> Result<impl IntoResponse> {
    Ok(Json(UserAdminService::new(state.pool()).update(id, &form).await?))
}

#[tracing::instrument(skip_all, fields(admin_id = %admin.id, user_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse> {
    let response = UserAdminService::new(state.pool())
        .delete(id, admin.id)
        .await?;
    Ok(Json(response))
}

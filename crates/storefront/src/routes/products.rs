//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;

use prostore_core::catalog::SearchParams;

use crate::error::Result;
use crate::services::CatalogService;
use crate::state::AppState;

fn catalog(state: &AppState) -> CatalogService<'_> {
    CatalogService::new(state.pool(), state.catalog_cache(), &state.config().store)
}

/// Home page lists: newest and featured products.
#[tracing::instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let service = catalog(&state);
    let latest = service.latest_products().await?;
    let featured = service.featured_products().await?;
    Ok(Json(json!({ "latest": latest, "featured": featured })))
}

pub async fn latest(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(catalog(&state).latest_products().await?))
}

pub async fn featured(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(catalog(&state).featured_products().await?))
}

pub async fn categories(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(catalog(&state).categories().await?))
}

/// Search with filters, sort and page.
#[tracing::instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse> {
    Ok(Json(catalog(&state).search(&params).await?))
}

/// Product detail by slug.
#[tracing::instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    Ok(Json(catalog(&state).product_by_slug(&slug).await?))
}

//! HTTP route handlers for the back office.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness
//! GET    /health/ready              - Readiness (database)
//!
//! # Auth
//! POST   /api/auth/sign-in          - Administrator sign-in (rate limited)
//! POST   /api/auth/sign-out         - Sign out
//! GET    /api/auth/me               - Signed-in administrator
//!
//! # Dashboard
//! GET    /api/dashboard             - Sales overview
//!
//! # Products
//! GET    /api/products              - List (query, page)
//! POST   /api/products              - Create
//! GET    /api/products/{id}         - Detail
//! PUT    /api/products/{id}         - Update
//! DELETE /api/products/{id}         - Delete
//!
//! # Orders
//! GET    /api/orders                - List (query by user name, page)
//! GET    /api/orders/{id}           - Detail
//! DELETE /api/orders/{id}           - Delete
//! POST   /api/orders/{id}/paid      - Mark paid (cash on delivery)
//! POST   /api/orders/{id}/delivered - Mark delivered
//!
//! # Users
//! GET    /api/users                 - List (query, page)
//! GET    /api/users/{id}            - Detail
//! PUT    /api/users/{id}            - Update name and role
//! DELETE /api/users/{id}            - Delete
//! ```

pub mod auth;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use prostore_storefront::middleware::auth_rate_limiter;
use serde::Deserialize;

use crate::state::AppState;

/// Listing filters shared by the back-office tables.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub query: Option<String>,
    pub page: Option<u32>,
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-in", post(auth::sign_in))
        .layer(auth_rate_limiter())
        .route("/sign-out", post(auth::sign_out))
        .route("/me", get(auth::me))
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show).delete(orders::delete))
        .route("/{id}/paid", post(orders::mark_paid))
        .route("/{id}/delivered", post(orders::deliver))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index))
        .route(
            "/{id}",
            get(users::show).put(users::update).delete(users::delete),
        )
}

/// Create all routes for the back office.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api/auth", auth_routes())
        .route("/api/dashboard", get(dashboard::overview))
        .nest("/api/products", product_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/users", user_routes())
}

async fn health() -> &'static str {
    "ok"
}

async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

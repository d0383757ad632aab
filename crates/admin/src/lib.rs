//! Prostore back-office library.
//!
//! Product, order and user management plus the sales dashboard. Shares the
//! storefront's database, repositories and order service.
//!
//! # Security
//!
//! Every `/api` route except sign-in requires a session whose user has the
//! `admin` role.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, body::Body, http::Request, middleware::from_fn};
use prostore_storefront::middleware::request_id_middleware;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::state::AppState;

/// Build the back-office router with its middleware stack.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    routes::routes()
        .layer(session_layer)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "admin_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use crate::config::AdminConfig;
    use crate::middleware::session::session_layer;

    fn test_app() -> Router {
        let config = AdminConfig {
            database_url: SecretString::from("postgres://localhost/prostore_test".to_string()),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            session_secret: SecretString::from("k".repeat(40)),
            page_size: 12,
            sentry_dsn: None,
            sentry_environment: None,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/prostore_test")
            .unwrap();
        app(
            AppState::new(config, pool),
            session_layer(MemoryStore::default(), false),
        )
    }

    async fn status_of(method: &str, uri: &str) -> StatusCode {
        test_app()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_health() {
        assert_eq!(status_of("GET", "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_back_office_requires_sign_in() {
        for (method, uri) in [
            ("GET", "/api/dashboard"),
            ("GET", "/api/products"),
            ("GET", "/api/orders"),
            ("GET", "/api/users"),
            ("GET", "/api/auth/me"),
        ] {
            assert_eq!(
                status_of(method, uri).await,
                StatusCode::UNAUTHORIZED,
                "{method} {uri}"
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_route() {
        assert_eq!(status_of("GET", "/api/nope").await, StatusCode::NOT_FOUND);
    }
}

//! Prostore storefront library.
//!
//! The storefront JSON API as a library, so the binary, the CLI and the tests
//! share one router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, body::Body, http::Request, middleware::from_fn};
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::state::AppState;

/// Build the storefront router with its middleware stack.
///
/// The session layer is passed in so tests can use an in-memory store.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    routes::routes()
        .layer(from_fn(middleware::cart_session_middleware))
        .layer(session_layer)
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
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
    use axum::http::{StatusCode, header};
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use crate::config::{StoreConfig, StorefrontConfig};
    use crate::middleware::session::session_layer;

    fn test_app() -> Router {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/prostore_test".to_string()),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(64)),
            paypal: None,
            stripe: None,
            store: StoreConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        };
        // Never connects unless a handler touches the database.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/prostore_test")
            .unwrap();
        let state = AppState::new(config, pool).unwrap();
        app(state, session_layer(MemoryStore::default(), false))
    }

    fn request(method: &str, uri: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.9")
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(request("GET", "/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_visitor_gets_session_cookie() {
        let response = test_app()
            .oneshot(request("GET", "/api/auth/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers().get(header::SET_COOKIE).unwrap();
        assert!(cookie.to_str().unwrap().starts_with("prostore_session="));
        assert_eq!(json_body(response).await, serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_orders_require_sign_in() {
        let response = test_app()
            .oneshot(request("GET", "/api/orders").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "User is not authenticated");
    }

    #[tokio::test]
    async fn test_stripe_return_requires_sign_in() {
        let uri = format!(
            "/api/orders/{}/stripe/success?payment_intent=pi_1",
            uuid::Uuid::new_v4()
        );
        let response = test_app()
            .oneshot(request("GET", &uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_place_order_requires_sign_in() {
        let response = test_app()
            .oneshot(
                request("POST", "/api/checkout/place-order")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_payment_methods_listed() {
        let response = test_app()
            .oneshot(
                request("GET", "/api/checkout/payment-methods")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["default_payment_method"], "PayPal");
        assert_eq!(body["payment_methods"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_stripe_webhook_needs_signature() {
        let response = test_app()
            .oneshot(
                request("POST", "/api/webhooks/stripe")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stripe_webhook_without_stripe_configured() {
        let response = test_app()
            .oneshot(
                request("POST", "/api/webhooks/stripe")
                    .header("stripe-signature", "t=1,v1=00")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

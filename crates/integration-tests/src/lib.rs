//! Integration tests for Prostore.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process router tests (no database needed)
//! cargo test -p prostore-integration-tests
//!
//! # Live tests against running servers and a seeded database
//! prostore-cli migrate && prostore-cli seed
//! cargo test -p prostore-integration-tests -- --ignored
//! ```
//!
//! Live tests read `STOREFRONT_URL` and `ADMIN_URL`, defaulting to the local
//! ports.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use reqwest::Client;
use secrecy::SecretString;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower_sessions::MemoryStore;

use prostore_admin::config::AdminConfig;
use prostore_storefront::config::{StoreConfig, StorefrontConfig};

/// Seeded administrator (see `prostore-cli seed`).
pub const SEED_ADMIN_EMAIL: &str = "admin@example.com";
/// Seeded shopper.
pub const SEED_USER_EMAIL: &str = "user@example.com";
pub const SEED_PASSWORD: &str = "123456";

/// Client address sent with in-process requests; rate limiting keys on it.
pub const TEST_CLIENT_IP: &str = "198.51.100.7";

#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

#[must_use]
pub fn admin_url() -> String {
    std::env::var("ADMIN_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// HTTP client that keeps session cookies between requests.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .connect_lazy("postgres://localhost/prostore_test")
        .unwrap()
}

/// Storefront router over a lazy pool and in-memory sessions.
#[must_use]
pub fn storefront_app() -> Router {
    let config = StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/prostore_test".to_string()),
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        session_secret: SecretString::from("s".repeat(48)),
        paypal: None,
        stripe: None,
        store: StoreConfig::default(),
        sentry_dsn: None,
        sentry_environment: None,
    };
    let state = prostore_storefront::state::AppState::new(config, lazy_pool()).unwrap();
    prostore_storefront::app(
        state,
        prostore_storefront::middleware::session::session_layer(MemoryStore::default(), false),
    )
}

/// Back-office router over a lazy pool and in-memory sessions.
#[must_use]
pub fn admin_app() -> Router {
    let config = AdminConfig {
        database_url: SecretString::from("postgres://localhost/prostore_test".to_string()),
        host: "127.0.0.1".parse().unwrap(),
        port: 3001,
        base_url: "http://localhost:3001".to_string(),
        session_secret: SecretString::from("a".repeat(48)),
        page_size: 12,
        sentry_dsn: None,
        sentry_environment: None,
    };
    let state = prostore_admin::state::AppState::new(config, lazy_pool());
    prostore_admin::app(
        state,
        prostore_admin::middleware::session::session_layer(MemoryStore::default(), false),
    )
}

/// Request builder carrying [`TEST_CLIENT_IP`].
pub fn request(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", TEST_CLIENT_IP)
}

#[must_use]
pub fn empty(builder: axum::http::request::Builder) -> Request<Body> {
    builder.body(Body::empty()).unwrap()
}

#[must_use]
pub fn json(builder: axum::http::request::Builder, body: &Value) -> Request<Body> {
    builder
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Sign in on a live server, keeping the session in `client`'s cookie jar.
pub async fn sign_in(client: &Client, base_url: &str, email: &str, password: &str) -> Value {
    let resp = client
        .post(format!("{base_url}/api/auth/sign-in"))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("sign-in request failed");
    resp.json().await.expect("sign-in body")
}

/// First product with stock left, cheapest first.
pub async fn first_in_stock_product(client: &Client, base_url: &str) -> Value {
    let body: Value = client
        .get(format!("{base_url}/api/products/search?sort=lowest"))
        .send()
        .await
        .expect("product search failed")
        .json()
        .await
        .expect("product page");
    body["data"]
        .as_array()
        .expect("product page")
        .iter()
        .find(|p| p["stock"].as_i64().unwrap_or(0) > 0)
        .cloned()
        .expect("an in-stock product")
}

/// Register a fresh shopper with a shipping address and cash on delivery.
pub async fn sign_up_checkout_ready_shopper(client: &Client, base_url: &str) -> String {
    let email = format!("shopper-{}@example.com", uuid::Uuid::new_v4().simple());
    let resp = client
        .post(format!("{base_url}/api/auth/sign-up"))
        .json(&serde_json::json!({
            "name": "Test Shopper",
            "email": email,
            "password": "secret123",
            "confirm_password": "secret123",
        }))
        .send()
        .await
        .expect("sign-up request failed");
    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);

    let resp = client
        .put(format!("{base_url}/api/checkout/shipping-address"))
        .json(&serde_json::json!({
            "full_name": "Test Shopper",
            "street_address": "1 Main St",
            "city": "Springfield",
            "postal_code": "12345",
            "country": "USA",
        }))
        .send()
        .await
        .expect("address request failed");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    let resp = client
        .put(format!("{base_url}/api/checkout/payment-method"))
        .json(&serde_json::json!({ "type": "CashOnDelivery" }))
        .send()
        .await
        .expect("payment method request failed");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    email
}

/// Put one unit of `product` in the cart and place the order.
///
/// Returns the new order id.
pub async fn place_order_for(client: &Client, base_url: &str, product: &Value) -> String {
    let resp = client
        .post(format!("{base_url}/api/cart/items"))
        .json(&serde_json::json!({ "product_id": product["id"] }))
        .send()
        .await
        .expect("add to cart failed");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    let body: Value = client
        .post(format!("{base_url}/api/checkout/place-order"))
        .send()
        .await
        .expect("place order failed")
        .json()
        .await
        .expect("place order body");
    assert_eq!(body["success"], true, "{body}");
    body["redirect_to"]
        .as_str()
        .expect("order redirect")
        .trim_start_matches("/order/")
        .to_string()
}

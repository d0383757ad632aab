//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                               - Liveness
//! GET    /health/ready                         - Readiness (database)
//!
//! # Catalog
//! GET    /api/home                             - Latest and featured products
//! GET    /api/products/latest                  - Newest products
//! GET    /api/products/featured                - Featured products
//! GET    /api/products/categories              - Categories with counts
//! GET    /api/products/search                  - Filtered search (q, category, price, rating, sort, page)
//! GET    /api/products/{slug}                  - Product detail
//!
//! # Reviews
//! POST   /api/reviews                          - Create or replace my review
//! GET    /api/reviews/{product_id}             - Reviews of a product
//! GET    /api/reviews/{product_id}/mine        - My review of a product
//!
//! # Cart
//! GET    /api/cart                             - My cart
//! POST   /api/cart/items                       - Add one unit
//! DELETE /api/cart/items/{product_id}          - Remove one unit
//!
//! # Checkout (requires auth)
//! GET    /api/checkout/payment-methods         - Accepted methods
//! PUT    /api/checkout/shipping-address        - Save address
//! PUT    /api/checkout/payment-method          - Save payment method
//! POST   /api/checkout/place-order             - Cart to order
//!
//! # Orders & payments
//! see [`orders`]
//!
//! # Auth
//! POST   /api/auth/sign-up                     - Register and sign in
//! POST   /api/auth/sign-in                     - Sign in
//! POST   /api/auth/sign-out                    - Sign out, delete cart
//! GET    /api/auth/me                          - Session user
//! GET    /api/account                          - My account
//! PUT    /api/account/profile                  - Update my name
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;
pub mod reviews;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Catalog routes.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/latest", get(products::latest))
        .route("/featured", get(products::featured))
        .route("/categories", get(products::categories))
        .route("/search", get(products::search))
        .route("/{slug}", get(products::show))
}

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(reviews::submit))
        .route("/{product_id}", get(reviews::list))
        .route("/{product_id}/mine", get(reviews::mine))
}

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::add))
        .route("/items/{product_id}", delete(cart::remove))
}

pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/payment-methods", get(checkout::payment_methods))
        .route("/shipping-address", put(checkout::update_address))
        .route("/payment-method", put(checkout::update_payment_method))
        .route("/place-order", post(checkout::place_order))
}

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::my_orders))
        .route("/{id}", get(orders::show))
        .route("/{id}/paypal", post(orders::create_paypal_order))
        .route("/{id}/paypal/approve", post(orders::approve_paypal_order))
        .route("/{id}/stripe", post(orders::create_stripe_payment_intent))
        .route("/{id}/stripe/success", get(orders::stripe_success))
}

/// Sign-in and sign-up, behind the strict rate limiter.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(auth::sign_up))
        .route("/sign-in", post(auth::sign_in))
        .layer(auth_rate_limiter())
        .route("/sign-out", post(auth::sign_out))
        .route("/me", get(auth::me))
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::account))
        .route("/profile", put(auth::update_profile))
}

/// Shopper API, behind the general rate limiter.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/home", get(products::home))
        .nest("/products", product_routes())
        .nest("/reviews", review_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/orders", order_routes())
        .nest("/account", account_routes())
        .layer(api_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes())
        .nest("/api/auth", auth_routes())
        .route("/api/webhooks/stripe", post(orders::stripe_webhook))
}

/// Liveness health check. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check: 503 when the database is unreachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

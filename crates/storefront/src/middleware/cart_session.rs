//! Session cart id middleware.
//!
//! Every visitor gets a random cart id in their session on first contact, so a
//! cart can be built before sign-in and handed over afterwards.

use axum::{extract::Request, middleware::Next, response::Response};
use tower_sessions::Session;
use uuid::Uuid;

use crate::models::session_keys;

/// Ensure the session holds a cart id.
///
/// Runs inside the session layer. Session store failures are logged and the
/// request continues; cart handlers then report the missing cart session.
pub async fn cart_session_middleware(request: Request, next: Next) -> Response {
    if let Some(session) = request.extensions().get::<Session>() {
        match session.get::<Uuid>(session_keys::SESSION_CART_ID).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                let cart_id = Uuid::new_v4();
                if let Err(e) = session.insert(session_keys::SESSION_CART_ID, cart_id).await {
                    tracing::warn!(error = %e, "Failed to store session cart id");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to read session cart id"),
        }
    }

    next.run(request).await
}

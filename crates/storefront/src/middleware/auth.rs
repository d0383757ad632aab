//! Authentication extractors.
//!
//! The signed-in user is kept in the session under
//! [`session_keys::CURRENT_USER`]. The anonymous cart id sits next to it under
//! [`session_keys::SESSION_CART_ID`].

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;
use uuid::Uuid;

use crate::models::{CurrentUser, session_keys};
use crate::services::CartContext;

/// Extractor that requires a signed-in user.
///
/// ```rust,ignore
/// async fn my_orders(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Rejection for requests that need a signed-in user.
#[derive(Debug)]
pub enum AuthRejection {
    /// No session layer ran for this request.
    MissingSession,
    /// Nobody is signed in.
    Unauthenticated,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::MissingSession => {
                tracing::error!("Session layer missing from router");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Self::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "success": false, "message": "User is not authenticated" })),
            )
                .into_response(),
        }
    }
}

async fn current_user(session: &Session) -> Option<CurrentUser> {
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::MissingSession)?;

        current_user(session)
            .await
            .map(Self)
            .ok_or(AuthRejection::Unauthenticated)
    }
}

/// Extractor that optionally gets the signed-in user.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => current_user(session).await,
            None => None,
        };
        Ok(Self(user))
    }
}

/// Extractor for cart handlers: the session cart id plus the user, if any.
///
/// A missing cart id is left to the cart service to report.
pub struct CartSession(pub CartContext);

impl<S> FromRequestParts<S> for CartSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self(CartContext::default()));
        };

        let session_cart_id = session
            .get::<Uuid>(session_keys::SESSION_CART_ID)
            .await
            .ok()
            .flatten();
        let user_id = current_user(session).await.map(|u| u.id);

        Ok(Self(CartContext {
            user_id,
            session_cart_id,
        }))
    }
}

/// Store the signed-in user in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Forget the signed-in user and the cart id (sign-out).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

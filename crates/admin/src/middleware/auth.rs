//! Authentication extractors for the back office.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use prostore_storefront::models::CurrentUser;

/// Session key for the signed-in administrator.
pub const CURRENT_ADMIN: &str = "current_admin";

/// Extractor that requires a signed-in administrator.
///
/// ```rust,ignore
/// async fn dashboard(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdmin(pub CurrentUser);

/// Rejection for back-office requests.
#[derive(Debug, PartialEq, Eq)]
pub enum AdminAuthRejection {
    MissingSession,
    /// Nobody is signed in.
    Unauthorized,
    /// Signed in, but not an administrator.
    Forbidden,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingSession => {
                tracing::error!("Session layer missing from admin router");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "User is not authenticated"),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "Only administrators can access this resource",
            ),
        };
        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::MissingSession)?;

        let admin: CurrentUser = session
            .get(CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        check_admin(admin).map(Self)
    }
}

/// Only users with the admin role get through.
///
/// # Errors
///
/// Returns `AdminAuthRejection::Forbidden` for shoppers.
pub fn check_admin(user: CurrentUser) -> Result<CurrentUser, AdminAuthRejection> {
    if user.role.is_admin() {
        Ok(user)
    } else {
        Err(AdminAuthRejection::Forbidden)
    }
}

/// Store the signed-in administrator in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(CURRENT_ADMIN, admin).await
}

/// End the back-office session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use prostore_core::{Email, UserId, UserRole};

    fn user(role: UserRole) -> CurrentUser {
        CurrentUser {
            id: UserId::new(),
            name: "Admin".into(),
            email: Email::parse("admin@example.com").unwrap(),
            role,
        }
    }

    #[test]
    fn test_admin_passes() {
        assert!(check_admin(user(UserRole::Admin)).is_ok());
    }

    #[test]
    fn test_shopper_is_forbidden() {
        assert_eq!(
            check_admin(user(UserRole::User)).unwrap_err(),
            AdminAuthRejection::Forbidden
        );
    }

    #[test]
    fn test_rejection_statuses() {
        assert_eq!(
            AdminAuthRejection::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AdminAuthRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}

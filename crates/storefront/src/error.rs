//! Unified error handling with Sentry integration.
//!
//! Handlers return `Result<T, AppError>`. Errors render as
//! `{ "success": false, "message": ... }` so clients read failures the same way
//! as action results. Server-side failures are captured to Sentry and their
//! details are not sent to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use prostore_core::cart::CartError;
use prostore_core::validation::{FieldError, ValidationErrors};

use crate::db::RepositoryError;
use crate::payments::PaymentError;
use crate::services::ServiceError;
use crate::services::auth::AuthError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// A service rejected the operation.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Payment processor failure.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Input failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("{0}")]
    Unauthorized(String),

    /// User is signed in but may not do this.
    #[error("{0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Conflicts with the current state of the resource.
    #[error("{0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error body sent to clients.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<&'a FieldError>>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => auth_status(err),
            Self::Service(err) => service_status(err),
            Self::Payment(err) => payment_status(err),
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Message safe to show the client.
    fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash)
            | Self::Service(ServiceError::Repository(_)) => "Internal server error".to_string(),
            Self::Payment(err) | Self::Service(ServiceError::Payment(err)) => {
                payment_message(err)
            }
            _ => self.to_string(),
        }
    }

    fn field_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors)
            | Self::Auth(AuthError::Validation(errors))
            | Self::Service(ServiceError::Validation(errors)) => Some(errors),
            _ => None,
        }
    }
}

const fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::Validation(_) => StatusCode::BAD_REQUEST,
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::UserAlreadyExists => StatusCode::CONFLICT,
        AuthError::UserNotFound => StatusCode::NOT_FOUND,
        AuthError::Repository(_) | AuthError::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

const fn service_status(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Validation(_) | ServiceError::MissingCartSession => StatusCode::BAD_REQUEST,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Conflict(_) | ServiceError::Cart(CartError::NotEnoughStock) => {
            StatusCode::CONFLICT
        }
        ServiceError::Cart(CartError::ItemNotInCart) => StatusCode::NOT_FOUND,
        ServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
        ServiceError::Forbidden => StatusCode::FORBIDDEN,
        ServiceError::Payment(err) => payment_status(err),
        ServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

const fn payment_status(err: &PaymentError) -> StatusCode {
    match err {
        PaymentError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        PaymentError::Http(_) | PaymentError::Api { .. } | PaymentError::Parse(_) => {
            StatusCode::BAD_GATEWAY
        }
        PaymentError::InvalidSignature(_) | PaymentError::InvalidAmount(_) => {
            StatusCode::BAD_REQUEST
        }
        PaymentError::NotCompleted => StatusCode::PAYMENT_REQUIRED,
    }
}

fn payment_message(err: &PaymentError) -> String {
    if err.is_upstream() {
        "Payment processor error".to_string()
    } else {
        err.to_string()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorBody {
            success: false,
            message: self.public_message(),
            errors: self.field_errors().map(|errors| errors.iter().collect()),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after sign-in to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on sign-out.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a shopper action.
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "...")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn status_of(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    async fn body_of(err: AppError) -> serde_json::Value {
        let response = err.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Product not found".to_string());
        assert_eq!(err.to_string(), "Product not found");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(status_of(AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AppError::Unauthorized("x".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AppError::Forbidden("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_of(AppError::RateLimited), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            status_of(AppError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_service_error_status_codes() {
        assert_eq!(
            status_of(ServiceError::NotFound("Order not found")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ServiceError::Cart(CartError::NotEnoughStock)),
            StatusCode::CONFLICT
        );
        assert_eq!(status_of(ServiceError::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(ServiceError::MissingCartSession), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(ServiceError::Payment(PaymentError::NotConfigured("Stripe"))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_of(AuthError::UserAlreadyExists), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_body_carries_domain_message() {
        let body = body_of(ServiceError::Cart(CartError::NotEnoughStock).into()).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Not enough stock");
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let body = body_of(AppError::Internal("pool exhausted".into())).await;
        assert_eq!(body["message"], "Internal server error");

        let upstream = PaymentError::Api {
            processor: "PayPal",
            status: 500,
            body: "stack trace".into(),
        };
        let body = body_of(upstream.into()).await;
        assert_eq!(body["message"], "Payment processor error");
    }

    #[tokio::test]
    async fn test_validation_lists_fields() {
        let errors = ValidationErrors::single("name", "Name must be at least 3 characters");
        let body = body_of(errors.into()).await;
        assert_eq!(body["message"], "Name must be at least 3 characters");
        assert_eq!(body["errors"][0]["field"], "name");
    }
}

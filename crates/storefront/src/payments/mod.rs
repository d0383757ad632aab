//! Payment processor clients.
//!
//! # Processors
//!
//! - [`paypal`] - Orders v2 API: create an order, capture it after buyer approval
//! - [`stripe`] - Payment Intents, plus signed `charge.succeeded` webhooks
//!
//! Both clients are optional. When a processor's credentials are missing the
//! storefront still serves the catalog and cash-on-delivery checkout, and the
//! processor's endpoints answer with [`PaymentError::NotConfigured`].

pub mod paypal;
pub mod stripe;

pub use paypal::PayPalClient;
pub use stripe::StripeClient;

use thiserror::Error;

/// Errors that can occur when talking to a payment processor.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Processor credentials are not configured.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Processor answered with a non-success status.
    #[error("{processor} returned {status}: {body}")]
    Api {
        processor: &'static str,
        status: u16,
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Webhook signature missing, stale or wrong.
    #[error("invalid webhook signature: {0}")]
    InvalidSignature(String),

    /// Amount cannot be expressed in the processor's units.
    #[error("amount out of range: {0}")]
    InvalidAmount(String),

    /// Capture did not settle, or settled a different processor order.
    #[error("Payment not completed")]
    NotCompleted,
}

impl PaymentError {
    /// Whether the failure is on the processor's side rather than the request's.
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Api { .. } | Self::Parse(_))
    }
}

/// Read a processor response: 200 and 201 carry JSON, anything else is an error
/// holding the body text.
async fn handle_response<T: serde::de::DeserializeOwned>(
    processor: &'static str,
    response: reqwest::Response,
) -> Result<T, PaymentError> {
    let status = response.status();
    if status == reqwest::StatusCode::OK || status == reqwest::StatusCode::CREATED {
        let body = response.text().await?;
        return Ok(serde_json::from_str(&body)?);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    tracing::warn!(processor, status = status.as_u16(), "Payment processor error");

    Err(PaymentError::Api {
        processor,
        status: status.as_u16(),
        body,
    })
}

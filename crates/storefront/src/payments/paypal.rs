//! PayPal REST client (Orders v2).
//!
//! Access tokens come from the client-credentials grant and are cached in
//! memory until shortly before they expire.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use prostore_core::{CurrencyCode, Money};

use super::{PaymentError, handle_response};
use crate::config::PayPalConfig;

const PROCESSOR: &str = "PayPal";

/// Tokens are refreshed this many seconds before PayPal would expire them.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// PayPal API client.
#[derive(Clone)]
pub struct PayPalClient {
    inner: Arc<PayPalClientInner>,
}

struct PayPalClientInner {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: SecretString,
    currency: CurrencyCode,
    /// In-memory token cache
    token: RwLock<Option<AccessToken>>,
}

impl std::fmt::Debug for PayPalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayPalClient")
            .field("base_url", &self.inner.base_url)
            .field("client_id", &self.inner.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
struct AccessToken {
    value: SecretString,
    /// Unix timestamp after which the token must not be used.
    expires_at: i64,
}

impl AccessToken {
    fn is_usable(&self, now: i64) -> bool {
        now < self.expires_at
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Token lifetime in seconds.
    expires_in: i64,
}

#[derive(Serialize)]
struct CreateOrderRequest<'a> {
    intent: &'static str,
    purchase_units: [PurchaseUnitRequest<'a>; 1],
}

#[derive(Serialize)]
struct PurchaseUnitRequest<'a> {
    amount: AmountRequest<'a>,
}

#[derive(Serialize)]
struct AmountRequest<'a> {
    currency_code: &'a str,
    value: String,
}

/// A PayPal order as returned on creation.
#[derive(Debug, Clone, Deserialize)]
pub struct PayPalOrder {
    pub id: String,
    pub status: String,
}

/// Result of capturing an approved PayPal order.
#[derive(Debug, Clone, Deserialize)]
pub struct Capture {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub payer: Option<Payer>,
    #[serde(default)]
    purchase_units: Vec<CapturedUnit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Payer {
    #[serde(default)]
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CapturedUnit {
    #[serde(default)]
    payments: Option<CapturedPayments>,
}

#[derive(Debug, Clone, Deserialize)]
struct CapturedPayments {
    #[serde(default)]
    captures: Vec<CaptureDetail>,
}

#[derive(Debug, Clone, Deserialize)]
struct CaptureDetail {
    amount: CapturedAmount,
}

#[derive(Debug, Clone, Deserialize)]
struct CapturedAmount {
    value: String,
}

impl Capture {
    /// Amount of the first capture of the first purchase unit.
    #[must_use]
    pub fn amount_paid(&self) -> Option<&str> {
        self.purchase_units
            .first()?
            .payments
            .as_ref()?
            .captures
            .first()
            .map(|c| c.amount.value.as_str())
    }

    #[must_use]
    pub fn payer_email(&self) -> &str {
        self.payer
            .as_ref()
            .and_then(|p| p.email_address.as_deref())
            .unwrap_or_default()
    }
}

impl PayPalClient {
    /// Create a new PayPal client.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Http` if the HTTP client cannot be built.
    pub fn new(config: &PayPalConfig, currency: CurrencyCode) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(PayPalClientInner {
                client,
                base_url: config.api_url.as_str().trim_end_matches('/').to_owned(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                currency,
                token: RwLock::new(None),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// A valid access token, from cache or a fresh client-credentials grant.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Api` if PayPal rejects the credentials.
    #[instrument(skip(self))]
    pub async fn access_token(&self) -> Result<SecretString, PaymentError> {
        let now = chrono::Utc::now().timestamp();

        if let Some(token) = self.inner.token.read().await.as_ref()
            && token.is_usable(now)
        {
            return Ok(token.value.clone());
        }

        let response = self
            .inner
            .client
            .post(self.endpoint("/v1/oauth2/token"))
            .basic_auth(
                &self.inner.client_id,
                Some(self.inner.client_secret.expose_secret()),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let grant: TokenResponse = handle_response(PROCESSOR, response).await?;
        let token = AccessToken {
            value: SecretString::from(grant.access_token),
            expires_at: now + grant.expires_in - TOKEN_EXPIRY_MARGIN_SECS,
        };
        let value = token.value.clone();
        *self.inner.token.write().await = Some(token);

        debug!(expires_in = grant.expires_in, "PayPal access token refreshed");
        Ok(value)
    }

    /// Open a PayPal order for `amount` in the store currency.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Api` if PayPal refuses the order.
    #[instrument(skip(self), fields(amount = %amount))]
    pub async fn create_order(&self, amount: Money) -> Result<PayPalOrder, PaymentError> {
        let token = self.access_token().await?;

        let body = CreateOrderRequest {
            intent: "CAPTURE",
            purchase_units: [PurchaseUnitRequest {
                amount: AmountRequest {
                    currency_code: self.inner.currency.code(),
                    value: amount.to_string(),
                },
            }],
        };

        let response = self
            .inner
            .client
            .post(self.endpoint("/v2/checkout/orders"))
            .bearer_auth(token.expose_secret())
            .json(&body)
            .send()
            .await?;

        handle_response(PROCESSOR, response).await
    }

    /// Capture an order the buyer has approved.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Api` if the capture is refused.
    #[instrument(skip(self))]
    pub async fn capture_payment(&self, paypal_order_id: &str) -> Result<Capture, PaymentError> {
        let token = self.access_token().await?;

        let response = self
            .inner
            .client
            .post(self.endpoint(&format!("/v2/checkout/orders/{paypal_order_id}/capture")))
            .bearer_auth(token.expose_secret())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        handle_response(PROCESSOR, response).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_amount_and_email() {
        let capture: Capture = serde_json::from_value(serde_json::json!({
            "id": "5O190127TN364715T",
            "status": "COMPLETED",
            "payer": { "email_address": "buyer@example.com" },
            "purchase_units": [{
                "payments": { "captures": [{ "amount": { "value": "167.77", "currency_code": "CAD" } }] }
            }]
        }))
        .unwrap();

        assert_eq!(capture.amount_paid(), Some("167.77"));
        assert_eq!(capture.payer_email(), "buyer@example.com");
    }

    #[test]
    fn test_capture_without_units() {
        let capture: Capture =
            serde_json::from_value(serde_json::json!({ "id": "X", "status": "PENDING" })).unwrap();
        assert_eq!(capture.amount_paid(), None);
        assert_eq!(capture.payer_email(), "");
    }

    #[test]
    fn test_order_request_shape() {
        let body = CreateOrderRequest {
            intent: "CAPTURE",
            purchase_units: [PurchaseUnitRequest {
                amount: AmountRequest {
                    currency_code: CurrencyCode::CAD.code(),
                    value: Money::from_whole(10).to_string(),
                },
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["intent"], "CAPTURE");
        assert_eq!(json["purchase_units"][0]["amount"]["currency_code"], "CAD");
        assert_eq!(json["purchase_units"][0]["amount"]["value"], "10.00");
    }

    #[test]
    fn test_token_expiry() {
        let token = AccessToken {
            value: SecretString::from("t".to_string()),
            expires_at: 1_000,
        };
        assert!(token.is_usable(999));
        assert!(!token.is_usable(1_000));
    }
}

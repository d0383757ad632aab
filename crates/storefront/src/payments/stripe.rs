//! Stripe client: Payment Intents and webhook verification.

use std::collections::HashMap;
use std::time::Duration;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, instrument};

use prostore_core::{CurrencyCode, Money, OrderId};

use super::{PaymentError, handle_response};
use crate::config::StripeConfig;

const PROCESSOR: &str = "Stripe";

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Maximum age of a signed webhook, in seconds.
const WEBHOOK_TOLERANCE_SECS: i64 = 300;

/// Metadata key linking a payment intent or charge to our order.
pub const ORDER_ID_METADATA_KEY: &str = "orderId";

/// Event type that marks an order paid.
pub const CHARGE_SUCCEEDED: &str = "charge.succeeded";

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    base_url: String,
    secret_key: SecretString,
    webhook_secret: SecretString,
    currency: CurrencyCode,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("base_url", &self.base_url)
            .field("secret_key", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// A Stripe payment intent.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub status: String,
    /// Amount in minor units.
    pub amount: i64,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentIntent {
    #[must_use]
    pub fn order_id(&self) -> Option<&str> {
        self.metadata.get(ORDER_ID_METADATA_KEY).map(String::as_str)
    }

    #[must_use]
    pub fn is_succeeded(&self) -> bool {
        self.status == "succeeded"
    }
}

/// A verified webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// The charge object of a `charge.succeeded` event.
#[derive(Debug, Clone, Deserialize)]
pub struct Charge {
    pub id: String,
    /// Amount in minor units.
    pub amount: i64,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub billing_details: BillingDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillingDetails {
    #[serde(default)]
    pub email: Option<String>,
}

impl Charge {
    #[must_use]
    pub fn order_id(&self) -> Option<&str> {
        self.metadata.get(ORDER_ID_METADATA_KEY).map(String::as_str)
    }

    /// Charged amount in major units, e.g. `"167.77"`.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidAmount` for negative amounts.
    pub fn amount_paid(&self) -> Result<Money, PaymentError> {
        let cents = u64::try_from(self.amount)
            .map_err(|_| PaymentError::InvalidAmount(self.amount.to_string()))?;
        Ok(Money::from_minor_units(cents))
    }
}

impl WebhookEvent {
    /// The charge carried by a `charge.succeeded` event, `None` for other events.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Parse` if the event object is not a charge.
    pub fn succeeded_charge(&self) -> Result<Option<Charge>, PaymentError> {
        if self.event_type != CHARGE_SUCCEEDED {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(self.data.object.clone())?))
    }
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Http` if the HTTP client cannot be built.
    pub fn new(config: &StripeConfig, currency: CurrencyCode) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.as_str().trim_end_matches('/').to_owned(),
            secret_key: config.secret_key.clone(),
            webhook_secret: config.webhook_secret.clone(),
            currency,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Create a payment intent for an order total.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidAmount` if the total does not fit in cents.
    /// Returns `PaymentError::Api` if Stripe refuses the intent.
    #[instrument(skip(self), fields(order_id = %order_id, amount = %amount))]
    pub async fn create_payment_intent(
        &self,
        amount: Money,
        order_id: OrderId,
    ) -> Result<PaymentIntent, PaymentError> {
        let cents = amount
            .to_minor_units()
            .ok_or_else(|| PaymentError::InvalidAmount(amount.to_string()))?;

        let form = [
            ("amount", cents.to_string()),
            ("currency", self.currency.lowercase()),
            ("metadata[orderId]", order_id.to_string()),
        ];

        let response = self
            .client
            .post(self.endpoint("/v1/payment_intents"))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&form)
            .send()
            .await?;

        handle_response(PROCESSOR, response).await
    }

    /// # Errors
    ///
    /// Returns `PaymentError::Api` if Stripe does not know the intent.
    #[instrument(skip(self))]
    pub async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
        let response = self
            .client
            .get(self.endpoint(&format!("/v1/payment_intents/{id}")))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await?;

        handle_response(PROCESSOR, response).await
    }

    /// Verify a webhook delivery and parse its event.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidSignature` if verification fails.
    /// Returns `PaymentError::Parse` if the payload is not an event.
    #[instrument(skip(self, payload, signature_header))]
    pub fn construct_event(
        &self,
        payload: &str,
        signature_header: &str,
    ) -> Result<WebhookEvent, PaymentError> {
        let now = chrono::Utc::now().timestamp();
        verify_signature(
            self.webhook_secret.expose_secret(),
            payload,
            signature_header,
            now,
        )?;
        let event: WebhookEvent = serde_json::from_str(payload)?;
        debug!(event_id = %event.id, event_type = %event.event_type, "Stripe webhook verified");
        Ok(event)
    }
}

/// Check a `Stripe-Signature` header (`t=<unix>,v1=<hex>[,v1=...]`).
///
/// The signed payload is `"{t}.{body}"`, HMAC-SHA256 keyed with the endpoint
/// secret. Any matching `v1` entry is accepted.
///
/// # Errors
///
/// Returns `PaymentError::InvalidSignature` when the header is malformed, the
/// timestamp is outside the tolerance, or no signature matches.
pub fn verify_signature(
    secret: &str,
    payload: &str,
    header: &str,
    now: i64,
) -> Result<(), PaymentError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| PaymentError::InvalidSignature("Missing timestamp".to_string()))?;
    if signatures.is_empty() {
        return Err(PaymentError::InvalidSignature(
            "No v1 signature".to_string(),
        ));
    }

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| PaymentError::InvalidSignature("Invalid timestamp".to_string()))?;
    if now.abs_diff(ts) > WEBHOOK_TOLERANCE_SECS.unsigned_abs() {
        return Err(PaymentError::InvalidSignature(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    let expected = sign(secret, timestamp, payload)?;

    if signatures
        .iter()
        .any(|candidate| constant_time_compare(&expected, candidate))
    {
        Ok(())
    } else {
        Err(PaymentError::InvalidSignature(
            "Signature mismatch".to_string(),
        ))
    }
}

fn sign(secret: &str, timestamp: &str, payload: &str) -> Result<String, PaymentError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::InvalidSignature(e.to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_4f9a8c2e71b3d6";
    const NOW: i64 = 1_700_000_000;

    fn header_for(payload: &str, ts: i64) -> String {
        format!("t={ts},v1={}", sign(SECRET, &ts.to_string(), payload).unwrap())
    }

    #[test]
    fn test_valid_signature() {
        let payload = r#"{"id":"evt_1","type":"charge.succeeded"}"#;
        let header = header_for(payload, NOW);
        assert!(verify_signature(SECRET, payload, &header, NOW).is_ok());
    }

    #[test]
    fn test_any_v1_entry_may_match() {
        let payload = "{}";
        let good = sign(SECRET, &NOW.to_string(), payload).unwrap();
        let header = format!("t={NOW},v1={},v1={good},v0=legacy", "0".repeat(64));
        assert!(verify_signature(SECRET, payload, &header, NOW).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let header = header_for(r#"{"amount":100}"#, NOW);
        let result = verify_signature(SECRET, r#"{"amount":1}"#, &header, NOW);
        assert!(matches!(result, Err(PaymentError::InvalidSignature(_))));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = "{}";
        let header = header_for(payload, NOW - WEBHOOK_TOLERANCE_SECS - 1);
        assert!(verify_signature(SECRET, payload, &header, NOW).is_err());
    }

    #[test]
    fn test_malformed_headers_rejected() {
        assert!(verify_signature(SECRET, "{}", "", NOW).is_err());
        assert!(verify_signature(SECRET, "{}", "v1=abc", NOW).is_err());
        assert!(verify_signature(SECRET, "{}", &format!("t={NOW}"), NOW).is_err());
        assert!(verify_signature(SECRET, "{}", "t=soon,v1=abc", NOW).is_err());
    }

    #[test]
    fn test_extreme_timestamps_rejected() {
        for ts in [i64::MIN, i64::MAX, i64::MIN + NOW] {
            let header = format!("t={ts},v1={}", "0".repeat(64));
            let result = verify_signature(SECRET, "{}", &header, NOW);
            assert!(matches!(result, Err(PaymentError::InvalidSignature(_))), "t={ts}");
        }
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
    }

    #[test]
    fn test_charge_succeeded_event() {
        let event: WebhookEvent = serde_json::from_value(serde_json::json!({
            "id": "evt_1",
            "type": "charge.succeeded",
            "data": { "object": {
                "id": "ch_1",
                "amount": 16777,
                "metadata": { "orderId": "7f8d6e1c-2b0a-4c51-9d3e-5a6b7c8d9e0f" },
                "billing_details": { "email": "buyer@example.com" }
            }}
        }))
        .unwrap();

        let charge = event.succeeded_charge().unwrap().unwrap();
        assert_eq!(charge.id, "ch_1");
        assert_eq!(charge.order_id(), Some("7f8d6e1c-2b0a-4c51-9d3e-5a6b7c8d9e0f"));
        assert_eq!(charge.amount_paid().unwrap().to_string(), "167.77");
        assert_eq!(charge.billing_details.email.as_deref(), Some("buyer@example.com"));
    }

    #[test]
    fn test_other_events_carry_no_charge() {
        let event: WebhookEvent = serde_json::from_value(serde_json::json!({
            "id": "evt_2",
            "type": "payment_intent.created",
            "data": { "object": { "id": "pi_1" } }
        }))
        .unwrap();
        assert!(event.succeeded_charge().unwrap().is_none());
    }

    #[test]
    fn test_payment_intent_metadata() {
        let intent: PaymentIntent = serde_json::from_value(serde_json::json!({
            "id": "pi_1",
            "client_secret": "pi_1_secret_x",
            "status": "succeeded",
            "amount": 1000,
            "metadata": { "orderId": "abc" }
        }))
        .unwrap();
        assert!(intent.is_succeeded());
        assert_eq!(intent.order_id(), Some("abc"));
    }
}

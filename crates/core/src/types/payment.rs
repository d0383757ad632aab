//! Payment processor results recorded on an order.

use serde::{Deserialize, Serialize};

/// Outcome reported by a payment processor.
///
/// For PayPal the `id` is first set to the processor's order id when the
/// payment is initiated, then checked against the capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PaymentResult {
    pub id: String,
    pub status: String,
    pub email_address: String,
    pub price_paid: String,
}

impl PaymentResult {
    /// Status string processors report for settled payments.
    pub const COMPLETED: &'static str = "COMPLETED";

    /// Placeholder recorded when a processor order has been opened but not captured.
    #[must_use]
    pub fn pending(processor_id: impl Into<String>) -> Self {
        Self {
            id: processor_id.into(),
            status: String::new(),
            email_address: String::new(),
            price_paid: "0".to_owned(),
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == Self::COMPLETED
    }
}

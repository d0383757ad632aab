//! Cart domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use prostore_core::cart::CartLine;
use prostore_core::pricing::PriceBreakdown;
use prostore_core::{CartId, UserId};

/// A persisted cart, keyed by session and optionally owned by a user.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: Option<UserId>,
    pub session_cart_id: Uuid,
    pub items: Vec<CartLine>,
    #[serde(flatten)]
    pub prices: PriceBreakdown,
    pub created_at: DateTime<Utc>,
}

impl Cart {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|l| l.qty).sum()
    }
}

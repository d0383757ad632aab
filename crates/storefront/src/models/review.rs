//! Review domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use prostore_core::{ProductId, ReviewId, UserId};

/// A product review with the reviewer's display name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub rating: i32,
    pub title: String,
    pub description: String,
    pub is_verified_purchase: bool,
    pub created_at: DateTime<Utc>,
    pub user_name: String,
}

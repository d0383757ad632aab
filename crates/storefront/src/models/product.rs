//! Catalog domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use prostore_core::{Money, ProductId};

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub category: String,
    pub images: Vec<String>,
    pub brand: String,
    pub description: String,
    pub stock: i32,
    pub price: Money,
    /// Average review rating, recomputed on every review write.
    pub rating: Decimal,
    pub num_reviews: i32,
    pub is_featured: bool,
    pub banner: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// First image, used as the cart line thumbnail.
    #[must_use]
    pub fn primary_image(&self) -> &str {
        self.images.first().map_or("", String::as_str)
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Number of products in a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

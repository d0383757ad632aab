//! Cart repository.
//!
//! Line items are stored as a JSONB array on the cart row; the price columns
//! are always written together with the items they were computed from.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use prostore_core::cart::CartLine;
use prostore_core::pricing::PriceBreakdown;
use prostore_core::{CartId, Money, UserId};

use super::RepositoryError;
use super::users::expect_one_row;
use crate::models::Cart;

pub(super) const CART_COLUMNS: &str = "id, user_id, session_cart_id, items, items_price, shipping_price, \
     tax_price, total_price, created_at";

#[derive(sqlx::FromRow)]
pub(crate) struct CartRow {
    id: CartId,
    user_id: Option<UserId>,
    session_cart_id: Uuid,
    items: Json<Vec<CartLine>>,
    items_price: Money,
    shipping_price: Money,
    tax_price: Money,
    total_price: Money,
    created_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(r: CartRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            session_cart_id: r.session_cart_id,
            items: r.items.0,
            prices: PriceBreakdown {
                items_price: r.items_price,
                shipping_price: r.shipping_price,
                tax_price: r.tax_price,
                total_price: r.total_price,
            },
            created_at: r.created_at,
        }
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The most recent cart owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(&format!(
            r"
            SELECT {CART_COLUMNS} FROM store.carts
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Cart::from))
    }

    /// The cart for an anonymous session.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_session(
        &self,
        session_cart_id: Uuid,
    ) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(&format!(
            r"
            SELECT {CART_COLUMNS} FROM store.carts
            WHERE session_cart_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "
        ))
        .bind(session_cart_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Cart::from))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: Option<UserId>,
        session_cart_id: Uuid,
        items: &[CartLine],
        prices: &PriceBreakdown,
    ) -> Result<Cart, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(&format!(
            r"
            INSERT INTO store.carts
                (user_id, session_cart_id, items, items_price, shipping_price, tax_price, total_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {CART_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(session_cart_id)
        .bind(Json(items))
        .bind(prices.items_price)
        .bind(prices.shipping_price)
        .bind(prices.tax_price)
        .bind(prices.total_price)
        .fetch_one(self.pool)
        .await?;
        Ok(row.into())
    }

    /// Replace the items and totals of a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart no longer exists.
    pub async fn update_items(
        &self,
        id: CartId,
        items: &[CartLine],
        prices: &PriceBreakdown,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE store.carts SET
                items = $2, items_price = $3, shipping_price = $4, tax_price = $5, total_price = $6
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(Json(items))
        .bind(prices.items_price)
        .bind(prices.shipping_price)
        .bind(prices.tax_price)
        .bind(prices.total_price)
        .execute(self.pool)
        .await?;
        expect_one_row(result.rows_affected())
    }

    /// Give an anonymous cart to a user who just signed in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart no longer exists.
    pub async fn assign_user(&self, id: CartId, user_id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE store.carts SET user_id = $2 WHERE id = $1")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        expect_one_row(result.rows_affected())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM store.carts WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

//! Review repository.

use sqlx::PgPool;
use tracing::instrument;

use prostore_core::forms::ReviewForm;
use prostore_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::Review;

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create the user's review of a product, or replace the one they already wrote.
    ///
    /// The product's average rating and review count are recomputed in the
    /// same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` if a statement fails.
    #[instrument(skip(self, review), fields(product_id = %review.product_id))]
    pub async fn upsert(&self, user_id: UserId, review: &ReviewForm) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<(ProductId,)> =
            sqlx::query_as("SELECT id FROM store.products WHERE id = $1 FOR UPDATE")
                .bind(review.product_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            r"
            INSERT INTO store.reviews (user_id, product_id, rating, title, description)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, product_id) DO UPDATE SET
                rating = EXCLUDED.rating,
                title = EXCLUDED.title,
                description = EXCLUDED.description
            ",
        )
        .bind(user_id)
        .bind(review.product_id)
        .bind(review.rating)
        .bind(&review.title)
        .bind(&review.description)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            UPDATE store.products p SET
                rating = COALESCE(s.avg_rating, 0),
                num_reviews = s.num_reviews
            FROM (
                SELECT AVG(rating)::numeric(3, 2) AS avg_rating, COUNT(*)::int AS num_reviews
                FROM store.reviews
                WHERE product_id = $1
            ) s
            WHERE p.id = $1
            ",
        )
        .bind(review.product_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Reviews of a product, newest first, with reviewer names.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(
            r"
            SELECT r.id, r.user_id, r.product_id, r.rating, r.title, r.description,
                   r.is_verified_purchase, r.created_at, u.name AS user_name
            FROM store.reviews r
            JOIN store.users u ON u.id = r.user_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;
        Ok(reviews)
    }

    /// The review `user_id` wrote for `product_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<Review>, RepositoryError> {
        let review = sqlx::query_as::<_, Review>(
            r"
            SELECT r.id, r.user_id, r.product_id, r.rating, r.title, r.description,
                   r.is_verified_purchase, r.created_at, u.name AS user_name
            FROM store.reviews r
            JOIN store.users u ON u.id = r.user_id
            WHERE r.user_id = $1 AND r.product_id = $2
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(review)
    }
}

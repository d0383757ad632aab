//! Product reviews.
//!
//! One review per user and product; resubmitting replaces it. The product's
//! rating and review count are recomputed in the same transaction.

use sqlx::PgPool;
use tracing::{info, instrument};

use prostore_core::forms::ReviewForm;
use prostore_core::{ProductId, UserId};

use super::{ActionResponse, ServiceError};
use crate::db::ReviewRepository;
use crate::models::Review;

pub struct ReviewService<'a> {
    reviews: ReviewRepository<'a>,
}

impl<'a> ReviewService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            reviews: ReviewRepository::new(pool),
        }
    }

    /// Create or replace the caller's review of a product.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the form is invalid.
    /// Returns `ServiceError::NotFound` if the product does not exist.
    #[instrument(skip(self, form), fields(product_id = %form.product_id))]
    pub async fn create_update_review(
        &self,
        user_id: UserId,
        form: &ReviewForm,
    ) -> Result<ActionResponse, ServiceError> {
        form.validate()?;
        self.reviews
            .upsert(user_id, form)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Product not found"))?;
        info!(rating = form.rating, "Review saved");
        Ok(ActionResponse::ok("Review submitted successfully"))
    }

    /// All reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn get_reviews(&self, product_id: ProductId) -> Result<Vec<Review>, ServiceError> {
        Ok(self.reviews.list_for_product(product_id).await?)
    }

    /// The caller's own review of a product, for pre-filling the form.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn get_review_by_product_id(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<Review>, ServiceError> {
        Ok(self
            .reviews
            .get_for_user_product(user_id, product_id)
            .await?)
    }
}

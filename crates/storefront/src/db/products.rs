//! Product repository for catalog queries and back-office writes.

use sqlx::PgPool;
use tracing::{debug, instrument};

use prostore_core::catalog::{Pagination, ProductFilter};
use prostore_core::forms::ProductDraft;
use prostore_core::ProductId;

use super::users::expect_one_row;
use super::{RepositoryError, conflict_on_unique, contains_pattern};
use crate::models::{CategoryCount, Product};

const PRODUCT_COLUMNS: &str = "id, name, slug, category, images, brand, description, stock, \
     price, rating, num_reviews, is_featured, banner, created_at";

const SEARCH_PREDICATE: &str = r"
    ($1::text IS NULL OR name ILIKE $1 ESCAPE '\')
    AND ($2::text IS NULL OR category = $2)
    AND ($3::text IS NULL OR brand ILIKE $3 ESCAPE '\')
    AND ($4::numeric IS NULL OR price >= $4)
    AND ($5::numeric IS NULL OR price <= $5)
    AND ($6::numeric IS NULL OR rating >= $6)
";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Newest products first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest(&self, limit: u32) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM store.products ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// Featured products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, limit: u32) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM store.products
            WHERE is_featured
            ORDER BY created_at DESC
            LIMIT $1
            "
        ))
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM store.products WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM store.products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Filtered, sorted, paginated product search.
    ///
    /// Returns the page and the total number of matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(sort = %filter.sort, page = page.page))]
    pub async fn search(
        &self,
        filter: &ProductFilter,
        page: Pagination,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let min_price = filter.price.map(|p| p.min);
        let max_price = filter.price.map(|p| p.max);
        let name_pattern = filter.query.as_deref().map(contains_pattern);
        let brand_pattern = filter.brand.as_deref().map(contains_pattern);

        // ORDER BY comes from a fixed set of clauses, never from input.
        let products = sqlx::query_as::<_, Product>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM store.products
            WHERE {SEARCH_PREDICATE}
            ORDER BY {order}
            LIMIT $7 OFFSET $8
            ",
            order = filter.sort.order_by()
        ))
        .bind(name_pattern.as_deref())
        .bind(filter.category.as_deref())
        .bind(brand_pattern.as_deref())
        .bind(min_price)
        .bind(max_price)
        .bind(filter.rating)
        .bind(page.limit_i64())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM store.products WHERE {SEARCH_PREDICATE}"
        ))
        .bind(name_pattern.as_deref())
        .bind(filter.category.as_deref())
        .bind(brand_pattern.as_deref())
        .bind(min_price)
        .bind(max_price)
        .bind(filter.rating)
        .fetch_one(self.pool)
        .await?;

        debug!(total, returned = products.len(), "Product search");
        Ok((products, total))
    }

    /// Distinct categories with product counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<CategoryCount>, RepositoryError> {
        let categories = sqlx::query_as::<_, CategoryCount>(
            r"
            SELECT category, COUNT(*) AS count
            FROM store.products
            GROUP BY category
            ORDER BY category
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    #[instrument(skip(self, draft), fields(slug = %draft.slug))]
    pub async fn create(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO store.products
                (name, slug, category, images, brand, description, stock, price, is_featured, banner)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&draft.name)
        .bind(&draft.slug)
        .bind(&draft.category)
        .bind(&draft.images)
        .bind(&draft.brand)
        .bind(&draft.description)
        .bind(draft.stock)
        .bind(draft.price)
        .bind(draft.is_featured)
        .bind(draft.banner.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Slug already exists"))?;
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    #[instrument(skip(self, draft), fields(slug = %draft.slug))]
    pub async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r"
            UPDATE store.products SET
                name = $2, slug = $3, category = $4, images = $5, brand = $6,
                description = $7, stock = $8, price = $9, is_featured = $10, banner = $11
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.slug)
        .bind(&draft.category)
        .bind(&draft.images)
        .bind(&draft.brand)
        .bind(&draft.description)
        .bind(draft.stock)
        .bind(draft.price)
        .bind(draft.is_featured)
        .bind(draft.banner.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Slug already exists"))?;

        product.ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        expect_one_row(result.rows_affected())
    }

    /// Total number of products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM store.products")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

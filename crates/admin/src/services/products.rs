//! Back-office product management.

use sqlx::PgPool;
use tracing::{info, instrument};

use prostore_core::ProductId;
use prostore_core::catalog::{Page, Pagination, ProductFilter};
use prostore_core::forms::ProductForm;
use prostore_storefront::db::ProductRepository;
use prostore_storefront::models::Product;
use prostore_storefront::services::{ActionResponse, ServiceError};

pub struct ProductAdminService<'a> {
    products: ProductRepository<'a>,
}

impl<'a> ProductAdminService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool),
        }
    }

    /// Products newest first, optionally filtered by name.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn list(
        &self,
        query: Option<&str>,
        page: Option<u32>,
        limit: u32,
    ) -> Result<Page<Product>, ServiceError> {
        let filter = ProductFilter {
            query: query
                .map(str::trim)
                .filter(|q| !q.is_empty() && *q != "all")
                .map(String::from),
            ..ProductFilter::default()
        };
        let pagination = Pagination::new(page, limit);
        let (products, total) = self.products.search(&filter, pagination).await?;
        Ok(Page::new(products, pagination, total))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product does not exist.
    pub async fn get(&self, id: ProductId) -> Result<Product, ServiceError> {
        self.products
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Product not found"))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the form is invalid.
    /// Returns `ServiceError::Conflict` if the slug is taken.
    #[instrument(skip(self, form))]
    pub async fn create(&self, form: ProductForm) -> Result<ActionResponse, ServiceError> {
        let draft = form.validate()?;
        let product = self
            .products
            .create(&draft)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Product not found"))?;
        info!(product_id = %product.id, slug = %product.slug, "Product created");
        Ok(ActionResponse::ok("Product created successfully."))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product does not exist.
    /// Returns `ServiceError::Validation` if the form is invalid.
    #[instrument(skip(self, form))]
    pub async fn update(
        &self,
        id: ProductId,
        form: ProductForm,
    ) -> Result<ActionResponse, ServiceError> {
        let draft = form.validate()?;
        self.products
            .update(id, &draft)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Product not found"))?;
        Ok(ActionResponse::ok("Product updated successfully."))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product does not exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<ActionResponse, ServiceError> {
        self.products
            .delete(id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Product not found"))?;
        Ok(ActionResponse::ok("Product deleted successfully."))
    }
}

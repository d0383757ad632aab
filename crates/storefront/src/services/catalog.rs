//! Catalog queries for the home page, product pages and search.
//!
//! Home-page lists (latest, featured, categories) are cached for 5 minutes.
//! Back-office edits run in another process and are picked up when entries
//! expire.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use prostore_core::ProductId;
use prostore_core::catalog::{FEATURED_PRODUCTS_LIMIT, Page, Pagination, SearchParams};

use super::ServiceError;
use crate::config::StoreConfig;
use crate::db::ProductRepository;
use crate::models::{CategoryCount, Product};

/// Cached catalog lists.
#[derive(Clone)]
pub enum CacheValue {
    Products(Arc<Vec<Product>>),
    Categories(Arc<Vec<CategoryCount>>),
}

/// In-process catalog cache shared by all handlers.
pub type CatalogCache = Cache<&'static str, CacheValue>;

const LATEST_KEY: &str = "products:latest";
const FEATURED_KEY: &str = "products:featured";
const CATEGORIES_KEY: &str = "categories";

/// Build the catalog cache (5 minute TTL).
#[must_use]
pub fn new_catalog_cache() -> CatalogCache {
    Cache::builder()
        .max_capacity(1000)
        .time_to_live(Duration::from_secs(300))
        .build()
}

/// Product browsing and search.
pub struct CatalogService<'a> {
    products: ProductRepository<'a>,
    cache: &'a CatalogCache,
    store: &'a StoreConfig,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, cache: &'a CatalogCache, store: &'a StoreConfig) -> Self {
        Self {
            products: ProductRepository::new(pool),
            cache,
            store,
        }
    }

    /// Newest products for the home page.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    #[instrument(skip(self))]
    pub async fn latest_products(&self) -> Result<Arc<Vec<Product>>, ServiceError> {
        if let Some(CacheValue::Products(products)) = self.cache.get(LATEST_KEY).await {
            debug!("Cache hit for latest products");
            return Ok(products);
        }

        let products = Arc::new(
            self.products
                .latest(self.store.latest_products_limit)
                .await?,
        );
        self.cache
            .insert(LATEST_KEY, CacheValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// Featured products for the home page carousel.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    #[instrument(skip(self))]
    pub async fn featured_products(&self) -> Result<Arc<Vec<Product>>, ServiceError> {
        if let Some(CacheValue::Products(products)) = self.cache.get(FEATURED_KEY).await {
            debug!("Cache hit for featured products");
            return Ok(products);
        }

        let products = Arc::new(self.products.featured(FEATURED_PRODUCTS_LIMIT).await?);
        self.cache
            .insert(FEATURED_KEY, CacheValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// Categories with product counts.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn categories(&self) -> Result<Arc<Vec<CategoryCount>>, ServiceError> {
        if let Some(CacheValue::Categories(categories)) = self.cache.get(CATEGORIES_KEY).await {
            return Ok(categories);
        }

        let categories = Arc::new(self.products.categories().await?);
        self.cache
            .insert(CATEGORIES_KEY, CacheValue::Categories(Arc::clone(&categories)))
            .await;
        Ok(categories)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no product has this slug.
    pub async fn product_by_slug(&self, slug: &str) -> Result<Product, ServiceError> {
        self.products
            .get_by_slug(slug)
            .await?
            .ok_or(ServiceError::NotFound("Product not found"))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product does not exist.
    pub async fn product_by_id(&self, id: ProductId) -> Result<Product, ServiceError> {
        self.products
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Product not found"))
    }

    /// Filtered, sorted, paginated search. Never cached.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    #[instrument(skip(self, params))]
    pub async fn search(&self, params: &SearchParams) -> Result<Page<Product>, ServiceError> {
        let filter = params.filter();
        let pagination = Pagination::new(params.page, self.store.page_size);
        let (products, total) = self.products.search(&filter, pagination).await?;
        Ok(Page::new(products, pagination, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_round_trips_lists() {
        let cache = new_catalog_cache();
        cache
            .insert(CATEGORIES_KEY, CacheValue::Categories(Arc::new(vec![CategoryCount {
                category: "Men's Dress Shirts".into(),
                count: 3,
            }])))
            .await;

        match cache.get(CATEGORIES_KEY).await {
            Some(CacheValue::Categories(c)) => assert_eq!(c.first().map(|c| c.count), Some(3)),
            _ => panic!("expected cached categories"),
        }
        assert!(cache.get(LATEST_KEY).await.is_none());
    }
}

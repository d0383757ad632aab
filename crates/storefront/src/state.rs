//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::payments::{PayPalClient, PaymentError, StripeClient};
use crate::services::{CatalogCache, new_catalog_cache};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    paypal: Option<PayPalClient>,
    stripe: Option<StripeClient>,
    catalog_cache: CatalogCache,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Payment clients are built only for processors with credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if a payment client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, PaymentError> {
        let currency = config.store.currency;
        let paypal = config
            .paypal
            .as_ref()
            .map(|c| PayPalClient::new(c, currency))
            .transpose()?;
        let stripe = config
            .stripe
            .as_ref()
            .map(|c| StripeClient::new(c, currency))
            .transpose()?;

        if paypal.is_none() {
            tracing::warn!("PayPal credentials not set, PayPal checkout disabled");
        }
        if stripe.is_none() {
            tracing::warn!("Stripe credentials not set, Stripe checkout disabled");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                paypal,
                stripe,
                catalog_cache: new_catalog_cache(),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn paypal(&self) -> Option<&PayPalClient> {
        self.inner.paypal.as_ref()
    }

    #[must_use]
    pub fn stripe(&self) -> Option<&StripeClient> {
        self.inner.stripe.as_ref()
    }

    /// Home-page catalog cache.
    #[must_use]
    pub fn catalog_cache(&self) -> &CatalogCache {
        &self.inner.catalog_cache
    }
}

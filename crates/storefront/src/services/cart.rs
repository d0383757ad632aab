//! Cart service.
//!
//! Carts belong to a session cart id, and to a user once one signs in. Prices
//! are snapshotted from the product row, never taken from the request, and
//! totals are recomputed on every change.

use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use prostore_core::cart::{CartLine, add_line, remove_line};
use prostore_core::pricing::calc_price;
use prostore_core::{ProductId, UserId};

use super::{ActionResponse, ServiceError};
use crate::db::{CartRepository, ProductRepository};
use crate::models::{Cart, Product};

/// Who is asking for a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartContext {
    pub user_id: Option<UserId>,
    pub session_cart_id: Option<Uuid>,
}

impl CartContext {
    fn session_cart_id(&self) -> Result<Uuid, ServiceError> {
        self.session_cart_id.ok_or(ServiceError::MissingCartSession)
    }
}

/// Cart operations.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// The caller's cart: by user when signed in, otherwise by session.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::MissingCartSession` without a session cart id.
    pub async fn get_my_cart(&self, ctx: CartContext) -> Result<Option<Cart>, ServiceError> {
        let session_cart_id = ctx.session_cart_id()?;
        let cart = match ctx.user_id {
            Some(user_id) => self.carts.find_by_user(user_id).await?,
            None => self.carts.find_by_session(session_cart_id).await?,
        };
        Ok(cart)
    }

    /// Add one unit of a product, creating the cart on first use.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product does not exist.
    /// Returns `ServiceError::Cart` if there is not enough stock.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_item(
        &self,
        ctx: CartContext,
        product_id: ProductId,
    ) -> Result<ActionResponse, ServiceError> {
        let session_cart_id = ctx.session_cart_id()?;
        let product = self.product(product_id).await?;
        let line = line_for(&product);

        let change = match self.get_my_cart(ctx).await? {
            None => {
                let mut items = Vec::new();
                let change = add_line(&mut items, line, product.stock)?;
                self.carts
                    .create(ctx.user_id, session_cart_id, &items, &calc_price(&items))
                    .await?;
                change
            }
            Some(mut cart) => {
                let change = add_line(&mut cart.items, line, product.stock)?;
                self.carts
                    .update_items(cart.id, &cart.items, &calc_price(&cart.items))
                    .await?;
                change
            }
        };

        Ok(ActionResponse::ok(change.message(&product.name)))
    }

    /// Remove one unit of a product.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product or cart does not exist.
    /// Returns `ServiceError::Cart` if the product is not in the cart.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(
        &self,
        ctx: CartContext,
        product_id: ProductId,
    ) -> Result<ActionResponse, ServiceError> {
        ctx.session_cart_id()?;
        let product = self.product(product_id).await?;

        let mut cart = self
            .get_my_cart(ctx)
            .await?
            .ok_or(ServiceError::NotFound("Cart Not Found"))?;

        remove_line(&mut cart.items, product_id)?;
        self.carts
            .update_items(cart.id, &cart.items, &calc_price(&cart.items))
            .await?;

        Ok(ActionResponse::ok(format!(
            "{} was removed from cart",
            product.name
        )))
    }

    /// Hand the anonymous session cart to a user who just signed in, unless
    /// they already have a cart of their own.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if a query fails.
    pub async fn adopt_session_cart(
        &self,
        user_id: UserId,
        session_cart_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let Some(session_cart_id) = session_cart_id else {
            return Ok(());
        };
        if self.carts.find_by_user(user_id).await?.is_some() {
            return Ok(());
        }
        if let Some(cart) = self.carts.find_by_session(session_cart_id).await?
            && cart.user_id.is_none()
        {
            self.carts.assign_user(cart.id, user_id).await?;
            info!(cart_id = %cart.id, "Session cart attached to user");
        }
        Ok(())
    }

    /// Delete the caller's cart (sign-out).
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if a query fails.
    pub async fn discard(&self, ctx: CartContext) -> Result<(), ServiceError> {
        if ctx.session_cart_id.is_none() {
            return Ok(());
        }
        if let Some(cart) = self.get_my_cart(ctx).await? {
            self.carts.delete(cart.id).await?;
        }
        Ok(())
    }

    async fn product(&self, id: ProductId) -> Result<Product, ServiceError> {
        self.products
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Product not found"))
    }
}

/// A one-unit cart line priced from the catalog.
fn line_for(product: &Product) -> CartLine {
    CartLine {
        product_id: product.id,
        name: product.name.clone(),
        slug: product.slug.clone(),
        qty: 1,
        image: product.primary_image().to_owned(),
        price: product.price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use prostore_core::Money;
    use rust_decimal::Decimal;

    fn product() -> Product {
        Product {
            id: ProductId::new(),
            name: "Polo Sporting Stretch Shirt".into(),
            slug: "polo-sporting-stretch-shirt".into(),
            category: "Men's Dress Shirts".into(),
            images: vec!["/images/p1-1.jpg".into(), "/images/p1-2.jpg".into()],
            brand: "Polo".into(),
            description: "Classic polo".into(),
            stock: 5,
            price: Money::from_whole(59),
            rating: Decimal::new(45, 1),
            num_reviews: 10,
            is_featured: true,
            banner: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_line_snapshots_catalog_fields() {
        let p = product();
        let line = line_for(&p);
        assert_eq!(line.product_id, p.id);
        assert_eq!(line.qty, 1);
        assert_eq!(line.image, "/images/p1-1.jpg");
        assert_eq!(line.price, Money::from_whole(59));
    }

    #[test]
    fn test_missing_session_is_reported() {
        let ctx = CartContext::default();
        assert!(matches!(
            ctx.session_cart_id(),
            Err(ServiceError::MissingCartSession)
        ));
    }
}

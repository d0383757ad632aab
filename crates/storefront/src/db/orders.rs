//! Order repository.
//!
//! Placing an order and recording its payment are both transactional: an order
//! is never left without its items, and stock is decremented exactly once.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::{info, instrument};

use prostore_core::catalog::Pagination;
use prostore_core::pricing::PriceBreakdown;
use prostore_core::{CartId, Email, Money, OrderId, PaymentMethod, PaymentResult, ShippingAddress, UserId};

use super::{RepositoryError, contains_pattern};
use super::carts::{CART_COLUMNS, CartRow};
use super::users::expect_one_row;
use crate::models::{
    Cart, LatestOrder, MonthlySales, Order, OrderDetail, OrderItem, OrderSummary, OrderUser,
    SalesData,
};

const ORDER_COLUMNS: &str = "o.id, o.user_id, o.shipping_address, o.payment_method, \
     o.payment_result, o.items_price, o.shipping_price, o.tax_price, o.total_price, o.is_paid, \
     o.paid_at, o.is_delivered, o.delivered_at, o.created_at";

/// Orders shown on the dashboard.
const LATEST_ORDERS_LIMIT: i64 = 6;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    shipping_address: Json<ShippingAddress>,
    payment_method: PaymentMethod,
    payment_result: Option<Json<PaymentResult>>,
    items_price: Money,
    shipping_price: Money,
    tax_price: Money,
    total_price: Money,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    is_delivered: bool,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(r: OrderRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            shipping_address: r.shipping_address.0,
            payment_method: r.payment_method,
            payment_result: r.payment_result.map(|Json(p)| p),
            prices: PriceBreakdown {
                items_price: r.items_price,
                shipping_price: r.shipping_price,
                tax_price: r.tax_price,
                total_price: r.total_price,
            },
            is_paid: r.is_paid,
            paid_at: r.paid_at,
            is_delivered: r.is_delivered,
            delivered_at: r.delivered_at,
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderWithUserRow {
    #[sqlx(flatten)]
    order: OrderRow,
    user_name: String,
    user_email: String,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn a cart into an order and empty the cart, in one transaction.
    ///
    /// The cart row is locked and re-read inside the transaction, so two
    /// concurrent checkouts of the same cart produce one order. Prices are
    /// copied from the locked cart as they stand. Returns `None` when the
    /// cart is missing or already empty.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// written in that case.
    #[instrument(skip(self, address), fields(cart_id = %cart_id))]
    pub async fn create_from_cart(
        &self,
        user_id: UserId,
        cart_id: CartId,
        address: &ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<Option<OrderId>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_as::<_, CartRow>(&format!(
            "SELECT {CART_COLUMNS} FROM store.carts WHERE id = $1 FOR UPDATE"
        ))
        .bind(cart_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(cart) = locked.map(Cart::from).filter(|c| !c.is_empty()) else {
            return Ok(None);
        };

        let (order_id,): (OrderId,) = sqlx::query_as(
            r"
            INSERT INTO store.orders
                (user_id, shipping_address, payment_method,
                 items_price, shipping_price, tax_price, total_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(Json(address))
        .bind(payment_method)
        .bind(cart.prices.items_price)
        .bind(cart.prices.shipping_price)
        .bind(cart.prices.tax_price)
        .bind(cart.prices.total_price)
        .fetch_one(&mut *tx)
        .await?;

        for line in &cart.items {
            let qty = i32::try_from(line.qty).map_err(|_| {
                RepositoryError::DataCorruption(format!("cart quantity out of range: {}", line.qty))
            })?;
            sqlx::query(
                r"
                INSERT INTO store.order_items (order_id, product_id, qty, price, name, slug, image)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(qty)
            .bind(line.price)
            .bind(&line.name)
            .bind(&line.slug)
            .bind(&line.image)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r"
            UPDATE store.carts SET
                items = '[]'::jsonb, items_price = 0, shipping_price = 0,
                tax_price = 0, total_price = 0
            WHERE id = $1
            ",
        )
        .bind(cart.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(order_id = %order_id, lines = cart.items.len(), "Order placed");
        Ok(Some(order_id))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM store.orders o WHERE o.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Order::from))
    }

    /// Order with its lines and the owner's name and email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if the owner's email is invalid.
    pub async fn get_detail(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderWithUserRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}, u.name AS user_name, u.email AS user_email
            FROM store.orders o
            JOIN store.users u ON u.id = o.user_id
            WHERE o.id = $1
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItem>(
            r"
            SELECT product_id, qty, price, name, slug, image
            FROM store.order_items
            WHERE order_id = $1
            ORDER BY name
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let email = Email::parse(&row.user_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Some(OrderDetail {
            order: row.order.into(),
            items,
            user: OrderUser {
                name: row.user_name,
                email,
            },
        }))
    }

    /// Record a processor result without marking the order paid.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn set_payment_result(
        &self,
        id: OrderId,
        result: &PaymentResult,
    ) -> Result<(), RepositoryError> {
        let outcome = sqlx::query("UPDATE store.orders SET payment_result = $2 WHERE id = $1")
            .bind(id)
            .bind(Json(result))
            .execute(self.pool)
            .await?;
        expect_one_row(outcome.rows_affected())
    }

    /// Mark an order paid and take its quantities out of stock.
    ///
    /// The order row is locked for the duration, so concurrent captures or
    /// webhook deliveries cannot decrement stock twice. Without a `result`
    /// (cash on delivery) any stored processor result is kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Conflict` if it is already paid.
    #[instrument(skip(self, result), fields(order_id = %id))]
    pub async fn mark_paid(
        &self,
        id: OrderId,
        result: Option<&PaymentResult>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let paid: Option<(bool,)> =
            sqlx::query_as("SELECT is_paid FROM store.orders WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        match paid {
            None => return Err(RepositoryError::NotFound),
            Some((true,)) => {
                return Err(RepositoryError::Conflict("Order is already paid".to_owned()));
            }
            Some((false,)) => {}
        }

        sqlx::query(
            r"
            UPDATE store.products p
            SET stock = p.stock - oi.qty
            FROM store.order_items oi
            WHERE oi.order_id = $1 AND p.id = oi.product_id
            ",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            UPDATE store.orders
            SET is_paid = true, paid_at = now(), payment_result = COALESCE($2, payment_result)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(result.map(Json))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(payment_id = result.map(|r| r.id.as_str()), "Order paid");
        Ok(())
    }

    /// Mark a paid order delivered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Conflict` if it is unpaid or already delivered.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn mark_delivered(&self, id: OrderId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let state: Option<(bool, bool)> = sqlx::query_as(
            "SELECT is_paid, is_delivered FROM store.orders WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        match state {
            None => return Err(RepositoryError::NotFound),
            Some((false, _)) => {
                return Err(RepositoryError::Conflict("Order is not paid".to_owned()));
            }
            Some((true, true)) => {
                return Err(RepositoryError::Conflict(
                    "Order is already delivered".to_owned(),
                ));
            }
            Some((true, false)) => {}
        }

        sqlx::query(
            "UPDATE store.orders SET is_delivered = true, delivered_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        page: Pagination,
    ) -> Result<(Vec<Order>, i64), RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM store.orders o
            WHERE o.user_id = $1
            ORDER BY o.created_at DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(user_id)
        .bind(page.limit_i64())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM store.orders WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(self.pool)
                .await?;

        Ok((rows.into_iter().map(Order::from).collect(), total))
    }

    /// All orders, newest first, optionally filtered by the owner's name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all(
        &self,
        user_query: Option<&str>,
        page: Pagination,
    ) -> Result<(Vec<OrderSummary>, i64), RepositoryError> {
        let pattern = user_query.map(contains_pattern);
        let rows = sqlx::query_as::<_, OrderWithUserRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}, u.name AS user_name, u.email AS user_email
            FROM store.orders o
            JOIN store.users u ON u.id = o.user_id
            WHERE ($1::text IS NULL OR u.name ILIKE $1 ESCAPE '\')
            ORDER BY o.created_at DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(pattern.as_deref())
        .bind(page.limit_i64())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*) FROM store.orders o
            JOIN store.users u ON u.id = o.user_id
            WHERE ($1::text IS NULL OR u.name ILIKE $1 ESCAPE '\')
            ",
        )
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        let orders = rows
            .into_iter()
            .map(|r| OrderSummary {
                order: r.order.into(),
                user_name: r.user_name,
            })
            .collect();
        Ok((orders, total))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.orders WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        expect_one_row(result.rows_affected())
    }

    /// Figures for the back-office dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn sales_data(&self) -> Result<SalesData, RepositoryError> {
        let (orders_count, products_count, users_count, total_sales): (i64, i64, i64, Money) =
            sqlx::query_as(
                r"
                SELECT
                    (SELECT COUNT(*) FROM store.orders),
                    (SELECT COUNT(*) FROM store.products),
                    (SELECT COUNT(*) FROM store.users),
                    (SELECT COALESCE(SUM(total_price), 0) FROM store.orders)
                ",
            )
            .fetch_one(self.pool)
            .await?;

        let sales_by_month = sqlx::query_as::<_, MonthlySales>(
            r"
            SELECT to_char(date_trunc('month', created_at), 'MM/YY') AS month,
                   SUM(total_price) AS total_sales
            FROM store.orders
            GROUP BY date_trunc('month', created_at)
            ORDER BY date_trunc('month', created_at)
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let latest_orders = sqlx::query_as::<_, LatestOrder>(
            r"
            SELECT o.id, u.name AS user_name, o.total_price, o.is_paid, o.is_delivered,
                   o.created_at
            FROM store.orders o
            JOIN store.users u ON u.id = o.user_id
            ORDER BY o.created_at DESC
            LIMIT $1
            ",
        )
        .bind(LATEST_ORDERS_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(SalesData {
            orders_count,
            products_count,
            users_count,
            total_sales,
            sales_by_month,
            latest_orders,
        })
    }
}

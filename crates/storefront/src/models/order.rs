//! Order domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use prostore_core::pricing::PriceBreakdown;
use prostore_core::{
    Email, Money, OrderId, PaymentMethod, PaymentResult, ProductId, ShippingAddress, UserId,
};

/// A placed order.
///
/// Address, payment method and prices are snapshots taken when the order was
/// placed; later edits to the user or cart do not change them.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_result: Option<PaymentResult>,
    #[serde(flatten)]
    pub prices: PriceBreakdown,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub qty: i32,
    pub price: Money,
    pub name: String,
    pub slug: String,
    pub image: String,
}

/// Owner details shown on the order page.
#[derive(Debug, Clone, Serialize)]
pub struct OrderUser {
    pub name: String,
    pub email: Email,
}

/// An order with its lines and owner.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub user: OrderUser,
}

/// An order row in back-office listings.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: Order,
    pub user_name: String,
}

/// Sales for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct MonthlySales {
    /// Month label in `MM/YY` form.
    pub month: String,
    pub total_sales: Money,
}

/// A recent order on the dashboard.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LatestOrder {
    pub id: OrderId,
    pub user_name: String,
    pub total_price: Money,
    pub is_paid: bool,
    pub is_delivered: bool,
    pub created_at: DateTime<Utc>,
}

/// Back-office dashboard figures.
#[derive(Debug, Clone, Serialize)]
pub struct SalesData {
    pub orders_count: i64,
    pub products_count: i64,
    pub users_count: i64,
    pub total_sales: Money,
    pub sales_by_month: Vec<MonthlySales>,
    pub latest_orders: Vec<LatestOrder>,
}

//! Domain models for the storefront.
//!
//! Rows are mapped into these types by the repositories in [`crate::db`]. They
//! serialize directly as API responses, so secrets such as password hashes
//! never appear here.

pub mod cart;
pub mod order;
pub mod product;
pub mod review;
pub mod session;
pub mod user;

pub use cart::Cart;
pub use order::{
    LatestOrder, MonthlySales, Order, OrderDetail, OrderItem, OrderSummary, OrderUser, SalesData,
};
pub use product::{CategoryCount, Product};
pub use review::Review;
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;

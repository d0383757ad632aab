//! Back-office services.
//!
//! - `products` - Catalog CRUD
//! - `users` - Account listing, role changes and deletion
//!
//! Orders and the dashboard use the storefront's `OrderService` directly.

pub mod products;
pub mod users;

pub use products::ProductAdminService;
pub use users::UserAdminService;

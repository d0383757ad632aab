//! Sample data for local development.
//!
//! Deletes every order, review, cart, product and user, then inserts a small
//! catalog plus one administrator and one shopper. Both accounts use the
//! password `123456`.

use prostore_core::UserRole;
use prostore_core::forms::ProductForm;
use prostore_storefront::db::{ProductRepository, RepositoryError, UserRepository};
use prostore_storefront::services::auth::hash_password;

use super::{CommandError, connect};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid sample product {0}: {1}")]
    InvalidProduct(&'static str, String),

    #[error("Invalid sample email: {0}")]
    InvalidEmail(#[from] prostore_core::EmailError),

    #[error("Could not hash password")]
    PasswordHash,
}

const SAMPLE_PASSWORD: &str = "123456";

/// (name, email, role)
const SAMPLE_USERS: &[(&str, &str, UserRole)] = &[
    ("Jane Admin", "admin@example.com", UserRole::Admin),
    ("John Shopper", "user@example.com", UserRole::User),
];

struct SampleProduct {
    name: &'static str,
    slug: &'static str,
    category: &'static str,
    brand: &'static str,
    description: &'static str,
    price: &'static str,
    stock: i32,
    is_featured: bool,
    banner: Option<&'static str>,
}

const SAMPLE_PRODUCTS: &[SampleProduct] = &[
    SampleProduct {
        name: "Polo Sporting Stretch Shirt",
        slug: "polo-sporting-stretch-shirt",
        category: "Men's Dress Shirts",
        brand: "Polo",
        description: "Classic Polo style with modern comfort",
        price: "59.99",
        stock: 5,
        is_featured: true,
        banner: Some("banner-1.jpg"),
    },
    SampleProduct {
        name: "Brooks Brothers Long Sleeved Shirt",
        slug: "brooks-brothers-long-sleeved-shirt",
        category: "Men's Dress Shirts",
        brand: "Brooks Brothers",
        description: "Timeless style and premium comfort",
        price: "85.90",
        stock: 10,
        is_featured: true,
        banner: Some("banner-2.jpg"),
    },
    SampleProduct {
        name: "Tommy Hilfiger Classic Fit Dress Shirt",
        slug: "tommy-hilfiger-classic-fit-dress-shirt",
        category: "Men's Dress Shirts",
        brand: "Tommy Hilfiger",
        description: "A perfect blend of sophistication and comfort",
        price: "99.95",
        stock: 0,
        is_featured: false,
        banner: None,
    },
    SampleProduct {
        name: "Calvin Klein Slim Fit Stretch Shirt",
        slug: "calvin-klein-slim-fit-stretch-shirt",
        category: "Men's Dress Shirts",
        brand: "Calvin Klein",
        description: "Streamlined design with flexible stretch fabric",
        price: "39.95",
        stock: 10,
        is_featured: false,
        banner: None,
    },
    SampleProduct {
        name: "Polo Ralph Lauren Oxford Shirt",
        slug: "polo-ralph-lauren-oxford-shirt",
        category: "Men's Dress Shirts",
        brand: "Polo",
        description: "Iconic Polo design with refined oxford fabric",
        price: "79.99",
        stock: 18,
        is_featured: false,
        banner: None,
    },
    SampleProduct {
        name: "Polo Classic Pink Hoodie",
        slug: "polo-classic-pink-hoodie",
        category: "Men's Sweatshirts",
        brand: "Polo",
        description: "Soft, stylish, and perfect for laid-back days",
        price: "99.99",
        stock: 10,
        is_featured: true,
        banner: None,
    },
];

impl SampleProduct {
    fn form(&self) -> ProductForm {
        ProductForm {
            name: self.name.to_owned(),
            slug: self.slug.to_owned(),
            category: self.category.to_owned(),
            brand: self.brand.to_owned(),
            description: self.description.to_owned(),
            stock: self.stock,
            images: vec![
                format!("/images/sample-products/{}-1.jpg", self.slug),
                format!("/images/sample-products/{}-2.jpg", self.slug),
            ],
            is_featured: self.is_featured,
            banner: self.banner.map(String::from),
            price: self.price.to_owned(),
        }
    }
}

/// Replace store data with the sample set.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a row cannot be
/// written.
pub async fn run() -> Result<(), SeedError> {
    let drafts = SAMPLE_PRODUCTS
        .iter()
        .map(|p| {
            p.form()
                .validate()
                .map_err(|e| SeedError::InvalidProduct(p.slug, e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let password_hash = hash_password(SAMPLE_PASSWORD).map_err(|_| SeedError::PasswordHash)?;

    let pool = connect().await?;

    tracing::info!("Clearing store data...");
    sqlx::query(
        "TRUNCATE store.order_items, store.orders, store.reviews, store.carts, \
         store.products, store.users CASCADE",
    )
    .execute(&pool)
    .await?;

    let products = ProductRepository::new(&pool);
    for draft in &drafts {
        products.create(draft).await?;
    }
    tracing::info!("Inserted {} products", drafts.len());

    let users = UserRepository::new(&pool);
    for (name, email, role) in SAMPLE_USERS {
        let email = prostore_core::Email::parse(email)?;
        users
            .create_with_password(name, &email, &password_hash, *role)
            .await?;
        tracing::info!("Created {} ({})", email, role);
    }

    tracing::info!("Seeding complete!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_products_are_valid() {
        for product in SAMPLE_PRODUCTS {
            let draft = product.form().validate();
            assert!(draft.is_ok(), "{} should validate: {draft:?}", product.slug);
        }
    }

    #[test]
    fn test_sample_slugs_are_unique() {
        let mut slugs: Vec<_> = SAMPLE_PRODUCTS.iter().map(|p| p.slug).collect();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), SAMPLE_PRODUCTS.len());
    }

    #[test]
    fn test_sample_users_include_an_admin() {
        assert!(SAMPLE_USERS.iter().any(|(_, _, role)| role.is_admin()));
    }
}

//! Input payloads and their validation rules.
//!
//! Each form validates into a typed value so handlers never touch raw input
//! after this point.

use serde::Deserialize;

use crate::types::{Email, Money, ProductId, UserRole};
use crate::validation::{ValidationErrors, Validator};

/// Minimum password length for sign-up and sign-in.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Sign-up request body.
#[derive(Debug, Clone, Deserialize)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// A sign-up that passed validation.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: Email,
    pub password: String,
}

impl SignUpForm {
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(self) -> Result<NewAccount, ValidationErrors> {
        let mut v = Validator::new();
        v.min_chars("name", &self.name, 3, "Name must be at least 3 characters");
        let email = Email::parse(&self.email).ok();
        v.check(email.is_some(), "email", "Invalid email address");
        check_password(&mut v, &self.password);
        v.check(
            self.confirm_password.chars().count() >= MIN_PASSWORD_LENGTH,
            "confirm_password",
            "Confirm password must be at least 6 characters",
        );
        v.check(
            self.password == self.confirm_password,
            "confirm_password",
            "Passwords don't match",
        );
        v.finish()?;

        Ok(NewAccount {
            name: self.name.trim().to_owned(),
            email: email.ok_or_else(|| ValidationErrors::single("email", "Invalid email address"))?,
            password: self.password,
        })
    }
}

/// Sign-in request body.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

impl SignInForm {
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(self) -> Result<(Email, String), ValidationErrors> {
        let mut v = Validator::new();
        let email = Email::parse(&self.email).ok();
        v.check(email.is_some(), "email", "Invalid email address");
        check_password(&mut v, &self.password);
        v.finish()?;
        let email =
            email.ok_or_else(|| ValidationErrors::single("email", "Invalid email address"))?;
        Ok((email, self.password))
    }
}

fn check_password(v: &mut Validator, password: &str) {
    v.check(
        password.chars().count() >= MIN_PASSWORD_LENGTH,
        "password",
        "Password must be at least 6 characters",
    );
}

/// Create/update product request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductForm {
    pub name: String,
    pub slug: String,
    pub category: String,
    pub brand: String,
    pub description: String,
    pub stock: i32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub banner: Option<String>,
    pub price: String,
}

/// A product payload that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub slug: String,
    pub category: String,
    pub brand: String,
    pub description: String,
    pub stock: i32,
    pub images: Vec<String>,
    pub is_featured: bool,
    pub banner: Option<String>,
    pub price: Money,
}

impl ProductForm {
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(self) -> Result<ProductDraft, ValidationErrors> {
        let mut v = Validator::new();
        v.min_chars("name", &self.name, 3, "Name must be at least 3 characters");
        v.min_chars("slug", &self.slug, 3, "Slug must be at least 3 characters");
        v.min_chars("category", &self.category, 3, "Category must be at least 3 characters");
        v.min_chars("brand", &self.brand, 3, "Brand must be at least 3 characters");
        v.min_chars(
            "description",
            &self.description,
            3,
            "Description must be at least 3 characters",
        );
        v.check(self.stock >= 0, "stock", "Stock cannot be negative");
        v.check(
            self.images.iter().any(|i| !i.trim().is_empty()),
            "images",
            "Product must have atleast one image",
        );
        let price = Money::parse(&self.price);
        if let Err(e) = &price {
            v.check(false, "price", e.to_string());
        }
        v.finish()?;

        let price = price.map_err(|e| ValidationErrors::single("price", e.to_string()))?;
        Ok(ProductDraft {
            name: self.name.trim().to_owned(),
            slug: self.slug.trim().to_owned(),
            category: self.category.trim().to_owned(),
            brand: self.brand.trim().to_owned(),
            description: self.description.trim().to_owned(),
            stock: self.stock,
            images: self
                .images
                .into_iter()
                .filter(|i| !i.trim().is_empty())
                .collect(),
            is_featured: self.is_featured,
            banner: self.banner.filter(|b| !b.trim().is_empty()),
            price,
        })
    }
}

/// Review request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewForm {
    pub product_id: ProductId,
    pub title: String,
    pub description: String,
    pub rating: i32,
}

impl ReviewForm {
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.min_chars("title", &self.title, 3, "Title must be at least 3 characters");
        v.min_chars(
            "description",
            &self.description,
            3,
            "Description must be at least 3 characters",
        );
        v.check(
            (1..=5).contains(&self.rating),
            "rating",
            "Rating must be between 1 and 5",
        );
        v.finish()
    }
}

/// Shopper profile update. Only the name is editable.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileForm {
    pub name: String,
}

impl ProfileForm {
    /// # Errors
    ///
    /// Returns an error when the name is too short.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.min_chars("name", &self.name, 3, "Name must be at least 3 characters");
        v.finish()
    }
}

/// Back-office user update.
#[derive(Debug, Clone, Deserialize)]
pub struct UserUpdateForm {
    pub name: String,
    pub role: UserRole,
}

impl UserUpdateForm {
    /// # Errors
    ///
    /// Returns an error when the name is too short.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.min_chars("name", &self.name, 3, "Name must be at least 3 characters");
        v.finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sign_up(password: &str, confirm: &str) -> SignUpForm {
        SignUpForm {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    #[test]
    fn test_sign_up_accepts_matching_passwords() {
        let account = sign_up("secret123", "secret123").validate().unwrap();
        assert_eq!(account.email.as_str(), "jane@example.com");
        assert_eq!(account.name, "Jane Doe");
    }

    #[test]
    fn test_sign_up_rejects_mismatch() {
        let err = sign_up("secret123", "secret124").validate().unwrap_err();
        assert_eq!(err.to_string(), "Passwords don't match");
    }

    #[test]
    fn test_sign_up_reports_every_field() {
        let form = SignUpForm {
            name: "Jo".into(),
            email: "jo".into(),
            password: "123".into(),
            confirm_password: "123".into(),
        };
        let err = form.validate().unwrap_err();
        assert!(err.has_field("name"));
        assert!(err.has_field("email"));
        assert!(err.has_field("password"));
    }

    #[test]
    fn test_sign_in_requires_valid_email() {
        let form = SignInForm {
            email: "not-an-email".into(),
            password: "secret123".into(),
        };
        assert_eq!(form.validate().unwrap_err().to_string(), "Invalid email address");
    }

    fn product() -> ProductForm {
        ProductForm {
            name: "Polo Sporting Stretch Shirt".into(),
            slug: "polo-sporting-stretch-shirt".into(),
            category: "Men's Dress Shirts".into(),
            brand: "Polo".into(),
            description: "Classic Polo style with modern comfort".into(),
            stock: 5,
            images: vec!["/images/sample-products/p1-1.jpg".into()],
            is_featured: true,
            banner: Some("banner-1.jpg".into()),
            price: "59.99".into(),
        }
    }

    #[test]
    fn test_product_validates_into_draft() {
        let draft = product().validate().unwrap();
        assert_eq!(draft.price.to_string(), "59.99");
        assert_eq!(draft.images.len(), 1);
    }

    #[test]
    fn test_product_requires_an_image() {
        let mut form = product();
        form.images = vec![String::new()];
        let err = form.validate().unwrap_err();
        assert_eq!(err.to_string(), "Product must have atleast one image");
    }

    #[test]
    fn test_product_price_precision() {
        let mut form = product();
        form.price = "59.999".into();
        let err = form.validate().unwrap_err();
        assert_eq!(err.to_string(), "Price must have exactly two decimal places");
    }

    #[test]
    fn test_empty_banner_becomes_none() {
        let mut form = product();
        form.banner = Some("   ".into());
        assert_eq!(form.validate().unwrap().banner, None);
    }

    #[test]
    fn test_review_rating_range() {
        let mut form = ReviewForm {
            product_id: ProductId::new(),
            title: "Great shirt".into(),
            description: "Fits well".into(),
            rating: 6,
        };
        assert!(form.validate().unwrap_err().has_field("rating"));
        form.rating = 5;
        assert!(form.validate().is_ok());
    }
}

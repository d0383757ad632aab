//! Authentication service.
//!
//! Email and password accounts with Argon2id hashes.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use tracing::{info, instrument};

use prostore_core::forms::{ProfileForm, SignInForm, SignUpForm};
use prostore_core::{UserId, UserRole};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Authentication service.
///
/// Handles user registration, login, and profile edits.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new shopper.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the form is invalid.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, form))]
    pub async fn sign_up(&self, form: SignUpForm) -> Result<User, AuthError> {
        let account = form.validate()?;
        let password_hash = hash_password(&account.password)?;

        let user = self
            .users
            .create_with_password(&account.name, &account.email, &password_hash, UserRole::User)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Check an email and password.
    ///
    /// Every failure, including malformed input, is reported as
    /// `AuthError::InvalidCredentials`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the credentials are wrong.
    /// Returns `AuthError::Repository` if the lookup fails.
    #[instrument(skip(self, form))]
    pub async fn sign_in(&self, form: SignInForm) -> Result<User, AuthError> {
        let (email, password) = form.validate().map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&password, &password_hash)?;

        Ok(user)
    }

    /// The signed-in user's account, with saved address and payment method.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account was deleted.
    pub async fn account(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Change the signed-in user's display name.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the name is too short.
    /// Returns `AuthError::UserNotFound` if the account was deleted.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        form: &ProfileForm,
    ) -> Result<User, AuthError> {
        form.validate()?;
        self.users
            .update_name(user_id, form.name.trim())
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("123456").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("123456", &hash).is_ok());
    }

    #[test]
    fn test_wrong_password_is_invalid_credentials() {
        let hash = hash_password("123456").unwrap();
        assert!(matches!(
            verify_password("654321", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("123456", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("123456").unwrap(), hash_password("123456").unwrap());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            AuthError::UserAlreadyExists.to_string(),
            "Email already exists, Please Sign In"
        );
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
    }
}

//! Administrator management.
//!
//! # Usage
//!
//! ```bash
//! prostore-cli admin create -e admin@example.com -n "Admin Name" -p 'secret123'
//! prostore-cli admin promote -e jane@example.com
//! prostore-cli admin demote -e jane@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use prostore_core::forms::MIN_PASSWORD_LENGTH;
use prostore_core::{Email, UserId, UserRole};
use prostore_storefront::db::{RepositoryError, UserRepository};
use prostore_storefront::services::auth::hash_password;
use thiserror::Error;

use super::{CommandError, connect};

#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Password must be at least {} characters", MIN_PASSWORD_LENGTH)]
    WeakPassword,

    #[error("Could not hash password")]
    PasswordHash,

    #[error("User already exists with email: {0}")]
    UserExists(String),

    #[error("No user with email: {0}")]
    UserNotFound(String),
}

fn parse_email(email: &str) -> Result<Email, AdminError> {
    Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))
}

fn check_password(password: &str) -> Result<(), AdminError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AdminError::WeakPassword);
    }
    Ok(())
}

/// Create a user with the admin role.
///
/// # Errors
///
/// Returns an error if the input is invalid, the email is taken or the
/// database is unreachable.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<UserId, AdminError> {
    let email = parse_email(email)?;
    check_password(password)?;
    let password_hash = hash_password(password).map_err(|_| AdminError::PasswordHash)?;

    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    tracing::info!("Creating admin user: {}", email);
    let user = users
        .create_with_password(name.trim(), &email, &password_hash, UserRole::Admin)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user.id)
}

/// Change the role of an existing user.
///
/// # Errors
///
/// Returns `AdminError::UserNotFound` if nobody has that email.
pub async fn set_role(email: &str, role: UserRole) -> Result<(), AdminError> {
    let email = parse_email(email)?;

    let pool = connect().await?;
    UserRepository::new(&pool)
        .set_role_by_email(&email, role)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AdminError::UserNotFound(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!("{} is now {}", email, role);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_email() {
        assert!(parse_email("admin@example.com").is_ok());
        assert!(matches!(
            parse_email("not-an-email"),
            Err(AdminError::InvalidEmail(e)) if e == "not-an-email"
        ));
    }

    #[test]
    fn test_check_password() {
        assert!(check_password("123456").is_ok());
        assert!(matches!(check_password("12345"), Err(AdminError::WeakPassword)));
    }

    #[test]
    fn test_weak_password_message() {
        assert_eq!(
            AdminError::WeakPassword.to_string(),
            "Password must be at least 6 characters"
        );
    }
}

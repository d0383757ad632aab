//! Authentication error types.

use thiserror::Error;

use prostore_core::validation::ValidationErrors;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Sign-up input failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// Wrong password, unknown email, or malformed credentials.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Email is already registered.
    #[error("Email already exists, Please Sign In")]
    UserAlreadyExists,

    /// User not found.
    #[error("User not found")]
    UserNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

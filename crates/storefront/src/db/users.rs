//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use prostore_core::catalog::Pagination;
use prostore_core::{Email, PaymentMethod, ShippingAddress, UserId, UserRole};

use super::{RepositoryError, conflict_on_unique, contains_pattern};
use crate::models::User;

const USER_COLUMNS: &str =
    "id, name, email, role, address, payment_method, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: String,
    role: UserRole,
    address: Option<Json<ShippingAddress>>,
    payment_method: Option<PaymentMethod>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: r.id,
            name: r.name,
            email,
            role: r.role,
            address: r.address.map(|Json(a)| a),
            payment_method: r.payment_method,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM store.users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM store.users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user and their password hash by email.
    ///
    /// Returns `None` if the user doesn't exist or has no password set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM store.users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };
        let Some(password_hash) = r.password_hash else {
            return Ok(None);
        };

        Ok(Some((User::try_from(r.user)?, password_hash)))
    }

    /// Create a new user with a password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, password_hash), fields(email = %email))]
    pub async fn create_with_password(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO store.users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(name)
        .bind(email.as_str())
        .bind(password_hash)
        .bind(role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Email already exists"))?;

        User::try_from(row)
    }

    /// Save the user's shipping address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_address(
        &self,
        id: UserId,
        address: &ShippingAddress,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE store.users SET address = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(Json(address))
        .execute(self.pool)
        .await?;

        expect_one_row(result.rows_affected())
    }

    /// Save the user's preferred payment method.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_payment_method(
        &self,
        id: UserId,
        method: PaymentMethod,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE store.users SET payment_method = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(method)
        .execute(self.pool)
        .await?;

        expect_one_row(result.rows_affected())
    }

    /// Change the user's display name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_name(&self, id: UserId, name: &str) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE store.users SET name = $2, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        User::try_from(row)
    }

    /// Change name and role (back-office).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_name_and_role(
        &self,
        id: UserId,
        name: &str,
        role: UserRole,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            UPDATE store.users SET name = $2, role = $3, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(name)
        .bind(role)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        User::try_from(row)
    }

    /// Set the role of the user with `email`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has that email.
    pub async fn set_role_by_email(
        &self,
        email: &Email,
        role: UserRole,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE store.users SET role = $2, updated_at = now() WHERE email = $1",
        )
        .bind(email.as_str())
        .bind(role)
        .execute(self.pool)
        .await?;

        expect_one_row(result.rows_affected())
    }

    /// Delete a user. Their carts, orders and reviews cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.users WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        expect_one_row(result.rows_affected())
    }

    /// List users newest first, optionally filtered by a name substring.
    ///
    /// Returns the page and the total number of matching users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        name_query: Option<&str>,
        page: Pagination,
    ) -> Result<(Vec<User>, i64), RepositoryError> {
        let pattern = name_query.map(contains_pattern);
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r"
            SELECT {USER_COLUMNS} FROM store.users
            WHERE ($1::text IS NULL OR name ILIKE $1 ESCAPE '\')
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(pattern.as_deref())
        .bind(page.limit_i64())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            r"SELECT COUNT(*) FROM store.users WHERE ($1::text IS NULL OR name ILIKE $1 ESCAPE '\')",
        )
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((users, total))
    }

    /// Total number of users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM store.users")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

pub(crate) const fn expect_one_row(rows_affected: u64) -> Result<(), RepositoryError> {
    if rows_affected == 0 {
        Err(RepositoryError::NotFound)
    } else {
        Ok(())
    }
}

//! Back-office user management.

use sqlx::PgPool;
use tracing::{info, instrument};

use prostore_core::UserId;
use prostore_core::catalog::{Page, Pagination};
use prostore_core::forms::UserUpdateForm;
use prostore_storefront::db::UserRepository;
use prostore_storefront::models::User;
use prostore_storefront::services::{ActionResponse, ServiceError};

pub struct UserAdminService<'a> {
    users: UserRepository<'a>,
}

impl<'a> UserAdminService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Users newest first, optionally filtered by name.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn list(
        &self,
        query: Option<&str>,
        page: Option<u32>,
        limit: u32,
    ) -> Result<Page<User>, ServiceError> {
        let query = query.map(str::trim).filter(|q| !q.is_empty() && *q != "all");
        let pagination = Pagination::new(page, limit);
        let (users, total) = self.users.list(query, pagination).await?;
        Ok(Page::new(users, pagination, total))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user does not exist.
    pub async fn get(&self, id: UserId) -> Result<User, ServiceError> {
        self.users
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("User not found"))
    }

    /// Change a user's name and role.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the name is too short.
    /// Returns `ServiceError::NotFound` if the user does not exist.
    #[instrument(skip(self, form))]
    pub async fn update(
        &self,
        id: UserId,
        form: &UserUpdateForm,
    ) -> Result<ActionResponse, ServiceError> {
        form.validate()?;
        let user = self
            .users
            .update_name_and_role(id, form.name.trim(), form.role)
            .await
            .map_err(|e| ServiceError::from_repo(e, "User not found"))?;
        info!(user_id = %user.id, role = %user.role, "User updated");
        Ok(ActionResponse::ok("User updated successfully"))
    }

    /// Delete a user. Administrators cannot delete themselves.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Conflict` when deleting the caller's own account.
    /// Returns `ServiceError::NotFound` if the user does not exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: UserId, acting: UserId) -> Result<ActionResponse, ServiceError> {
        if id == acting {
            return Err(ServiceError::Conflict(
                "You cannot delete your own account".to_string(),
            ));
        }
        self.users
            .delete(id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "User not found"))?;
        Ok(ActionResponse::ok("User deleted successfully"))
    }
}

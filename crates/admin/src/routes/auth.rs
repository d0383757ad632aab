//! Back-office sign-in and sign-out.

use axum::{Json, extract::State, response::IntoResponse};
use tower_sessions::Session;

use prostore_core::forms::SignInForm;
use prostore_storefront::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use prostore_storefront::models::CurrentUser;
use prostore_storefront::services::{ActionResponse, AuthService};

use crate::middleware::{RequireAdmin, check_admin, clear_current_admin, set_current_admin};
use crate::state::AppState;

/// Sign in with email and password. Only administrators are let in.
#[tracing::instrument(skip_all)]
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<SignInForm>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool()).sign_in(form).await?;
    let admin = check_admin(CurrentUser::from(&user)).map_err(|_| {
        tracing::warn!(user_id = %user.id, "Non-admin back-office sign-in refused");
        AppError::Forbidden("Only administrators can access this resource".to_string())
    })?;

    set_current_admin(&session, &admin)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(&admin.id, Some(admin.email.as_str()));

    tracing::info!(user_id = %admin.id, "Administrator signed in");
    Ok(Json(ActionResponse::ok("Signed in successfully")))
}

pub async fn sign_out(session: Session) -> Result<impl IntoResponse> {
    clear_current_admin(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();
    Ok(Json(ActionResponse::ok("Signed out successfully")))
}

pub async fn me(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
    Json(admin)
}

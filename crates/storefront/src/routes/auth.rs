//! Authentication and account route handlers.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tower_sessions::Session;

use prostore_core::forms::{ProfileForm, SignInForm, SignUpForm};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{CartSession, OptionalAuth, RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::{ActionResponse, AuthService, CartContext, CartService};
use crate::state::AppState;

/// Put the user in the session and hand over the anonymous cart.
async fn start_session(
    state: &AppState,
    session: &Session,
    ctx: CartContext,
    user: &User,
) -> Result<()> {
    CartService::new(state.pool())
        .adopt_session_cart(user.id, ctx.session_cart_id)
        .await?;

    // cycle_id keeps data, so the cart id survives sign-in
    set_current_user(session, &CurrentUser::from(user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Register and sign in.
#[tracing::instrument(skip_all)]
pub async fn sign_up(
    State(state): State<AppState>,
    session: Session,
    CartSession(ctx): CartSession,
    Json(form): Json<SignUpForm>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool()).sign_up(form).await?;
    start_session(&state, &session, ctx, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(ActionResponse::ok("User registered successfully")),
    ))
}

#[tracing::instrument(skip_all)]
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    CartSession(ctx): CartSession,
    Json(form): Json<SignInForm>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool()).sign_in(form).await?;
    start_session(&state, &session, ctx, &user).await?;
    tracing::info!(user_id = %user.id, "User signed in");
    Ok(Json(ActionResponse::ok("Signed in successfully")))
}

/// Delete the current cart and end the session.
#[tracing::instrument(skip_all)]
pub async fn sign_out(
    State(state): State<AppState>,
    session: Session,
    CartSession(ctx): CartSession,
) -> Result<impl IntoResponse> {
    CartService::new(state.pool()).discard(ctx).await?;
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();
    Ok(Json(ActionResponse::ok("Signed out successfully")))
}

/// The signed-in user from the session, or `null`.
pub async fn me(OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    Json(user)
}

/// Full account with saved address and payment method.
pub async fn account(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse> {
    Ok(Json(AuthService::new(state.pool()).account(user.id).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %current.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Json(form): Json<ProfileForm>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool())
        .update_profile(current.id, &form)
        .await?;

    // Keep the session copy of the name in step.
    session
        .insert(crate::models::session_keys::CURRENT_USER, CurrentUser::from(&user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    Ok(Json(ActionResponse::ok("User updated successfully")))
}

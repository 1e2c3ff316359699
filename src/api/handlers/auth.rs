use axum::{extract::State, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::{ChangePasswordRequest, LoginRequest, RegisterRequest};
use crate::api::dtos::responses::MessageResponse;
use crate::api::extractors::{auth::AuthUser, validated::ValidatedJson};
use crate::domain::models::{auth::AuthResponse, user::User};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(username), Some(email), Some(password)) = (payload.username, payload.email, payload.password) else {
        return Err(AppError::invalid_field("body", "username, email and password are required"));
    };

    if state.user_repo.find_by_username(&username).await?.is_some() {
        return Err(AppError::InvalidOperation("Username already taken".into()));
    }
    if state.user_repo.find_by_email(&email).await?.is_some() {
        return Err(AppError::InvalidOperation("Email already registered".into()));
    }

    let password_hash = state.auth_service.hash_password(&password)?;
    let created = state.user_repo.create(&User::new(username, email, password_hash)).await?;
    let token = state.auth_service.issue_token(&created)?;

    info!("Registered user: {}", created.id);

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user: created.public() })))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(AppError::invalid_field("body", "email and password are required"));
    };

    let mut user = state.user_repo.find_by_email(&email).await?
        .ok_or_else(|| AppError::Unauthenticated("Invalid credentials".into()))?;

    if !state.auth_service.verify_password(&password, &user.password_hash)? {
        warn!("Failed login attempt for user {}", user.id);
        return Err(AppError::Unauthenticated("Invalid credentials".into()));
    }

    if !user.is_active {
        return Err(AppError::Unauthenticated("Account is deactivated".into()));
    }

    let now = Utc::now();
    state.user_repo.touch_last_login(&user.id, now).await?;
    user.last_login = Some(now);

    let token = state.auth_service.issue_token(&user)?;

    info!("User logged in: {}", user.id);

    Ok(Json(AuthResponse { token, user: user.public() }))
}

pub async fn profile(auth: AuthUser) -> Result<impl IntoResponse, AppError> {
    Ok(Json(auth.user.public()))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.revoke(&auth.token_id, auth.token_expires_at).await?;

    info!("User logged out: {}", auth.user.id);

    Ok(Json(MessageResponse::new("Logged out successfully")))
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(current), Some(new)) = (payload.current_password, payload.new_password) else {
        return Err(AppError::invalid_field("body", "currentPassword and newPassword are required"));
    };

    if !state.auth_service.verify_password(&current, &auth.user.password_hash)? {
        return Err(AppError::InvalidOperation("Current password is incorrect".into()));
    }

    let password_hash = state.auth_service.hash_password(&new)?;
    state.user_repo.update_password(&auth.user.id, &password_hash).await?;

    info!("Password changed for user: {}", auth.user.id);

    Ok(Json(MessageResponse::new("Password changed successfully")))
}

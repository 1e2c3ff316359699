use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::{ListUsersQuery, UpdateUserRequest};
use crate::api::dtos::responses::MessageResponse;
use crate::api::extractors::{
    guards::{AdminUser, SelfOrAdmin, StatsViewer},
    validated::{ValidatedJson, ValidatedQuery},
};
use crate::domain::models::user::{PublicUser, Role};
use crate::domain::services::statistics::user_stats;
use crate::error::AppError;
use std::sync::Arc;
use tracing::{info, error};

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ValidatedQuery(query): ValidatedQuery<ListUsersQuery>,
) -> Result<impl IntoResponse, AppError> {
    let users = state.user_repo.list(query.role()?, query.is_active).await?;
    let safe_users: Vec<PublicUser> = users.iter().map(PublicUser::from).collect();
    Ok(Json(safe_users))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    access: SelfOrAdmin,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_repo.find_by_id(&access.target_id).await?
        .ok_or(AppError::NotFound("User not found".into()))?;
    Ok(Json(user.public()))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    access: SelfOrAdmin,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let requester = &access.auth.user;
    let mut target = state.user_repo.find_by_id(&access.target_id).await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    let changes = payload.into_changes(requester.is_admin())?;

    if let Some(username) = changes.username.as_deref() {
        if let Some(other) = state.user_repo.find_by_username(username).await? {
            if other.id != target.id {
                return Err(AppError::InvalidOperation("Username already taken".into()));
            }
        }
    }
    if let Some(email) = changes.email.as_deref() {
        if let Some(other) = state.user_repo.find_by_email(email).await? {
            if other.id != target.id {
                return Err(AppError::InvalidOperation("Email already registered".into()));
            }
        }
    }

    if changes.revokes_admin(&target) && state.user_repo.count_by_role(Role::Admin).await? <= 1 {
        return Err(AppError::InvalidOperation("Cannot demote or deactivate the last administrator".into()));
    }

    changes.apply(&mut target);
    let updated = state.user_repo.update(&target).await?;

    info!("User {} updated by {}", updated.id, requester.id);

    Ok(Json(updated.public()))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let target = state.user_repo.find_by_id(&user_id).await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    if target.is_admin() && state.user_repo.count_by_role(Role::Admin).await? <= 1 {
        return Err(AppError::InvalidOperation("Cannot delete the last administrator".into()));
    }

    match state.user_repo.delete(&target.id).await {
        Ok(_) => {
            info!("Deleted user {} (by {})", user_id, admin.user.id);
            Ok(Json(MessageResponse::new("User deleted successfully")))
        },
        Err(e) => {
            error!("Failed to delete user {}: {:?}", user_id, e);
            Err(e)
        }
    }
}

pub async fn get_user_stats(
    State(state): State<Arc<AppState>>,
    _viewer: StatsViewer,
) -> Result<impl IntoResponse, AppError> {
    let counts = state.user_repo.role_counts().await?;
    Ok(Json(user_stats(&counts)))
}
